//! Testing utilities for the MeetLocal platform.
//!
//! Deterministic stand-ins for every environment seam the engine has:
//!
//! - [`FixedClock`]: deterministic time
//! - [`MemoryStore`]: in-memory [`AdmissionStore`] with the same
//!   serialization guarantees as the production store, plus failure
//!   injection for atomicity tests
//! - [`MockPaymentGateway`]: scriptable payment collaborator
//! - [`RecordingNotifier`]: captures dispatched notifications
//! - [`builders`]: compact test-data constructors
//!
//! [`AdmissionStore`]: meetlocal_core::store::AdmissionStore

pub mod builders;
mod clock;
mod gateway;
mod memory_store;
mod notifier;

pub use clock::{test_clock, FixedClock};
pub use gateway::MockPaymentGateway;
pub use memory_store::MemoryStore;
pub use notifier::RecordingNotifier;
