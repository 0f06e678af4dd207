//! Core domain of the MeetLocal events platform.
//!
//! MeetLocal pairs capacity-constrained, demographically balanced social
//! events with registration, payment collection and post-event matching.
//! This crate owns the hard part: the admission control and waitlist
//! balancing engine.
//!
//! # Architecture
//!
//! - [`admission`]: the pure decision pipeline (capacity gate, duplicate
//!   check, age-bracket classifier, gender-ratio evaluator).
//! - [`registration`] / [`payments`]: the transactional write paths. Both
//!   run against explicit units of work ([`store`]) that lock the event
//!   row, so the decide-then-write cycle is serialized per event and a
//!   mid-sequence failure rolls back every staged write.
//! - [`waitlist`]: FIFO deferral queue and the promote scan that re-opens
//!   payment opportunities when a slot frees up.
//! - [`cancellation`]: the compensating flow of cancel, waitlist re-scan
//!   and time-windowed goodwill vouchers.
//! - [`capacity`]: the one-shot 90% capacity warning.
//! - [`payment`] / [`notification`]: collaborator seams (Stripe-like
//!   gateway, templated mail); both are black boxes to the engine.
//! - [`policy`]: explicit configuration objects instead of ambient
//!   constants, so tests can vary policy freely.

pub mod admission;
pub mod cancellation;
pub mod capacity;
pub mod environment;
pub mod error;
pub mod notification;
pub mod payment;
pub mod payments;
pub mod policy;
pub mod registration;
pub mod store;
pub mod types;
pub mod waitlist;

pub use admission::{Admission, AdmissionEvaluator, AdmissionSnapshot, BracketTally};
pub use cancellation::{CancellationOutcome, CancellationService};
pub use capacity::CapacityMonitor;
pub use environment::{Clock, SystemClock};
pub use error::{AdmissionError, CancellationError, PaymentError, StoreError};
pub use payments::{
    CheckoutOutcome, ConfirmationOutcome, PaymentService, PriceBreakdown, SlotAvailability,
};
pub use policy::{AdmissionPolicy, CancellationPolicy};
pub use registration::RegistrationService;
pub use waitlist::WaitlistManager;
