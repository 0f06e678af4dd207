//! MeetLocal HTTP server.
//!
//! Wires the admission engine (`meetlocal-core`) to `PostgreSQL`
//! persistence (`meetlocal-postgres`) and serves the registration,
//! payment and cancellation flows over an Axum API.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notifications;
pub mod payment_gateway;
pub mod server;

pub use app::{build_state, App, BootstrapError};
pub use config::Config;
