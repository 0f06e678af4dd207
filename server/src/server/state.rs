//! Application state for the MeetLocal HTTP server.
//!
//! Contains the engine services and shared resources the handlers need.
//! It's cloned (cheaply via Arc) for each request.

use chrono_tz::Tz;
use meetlocal_core::environment::Clock;
use meetlocal_core::store::AdmissionStore;
use meetlocal_core::{CancellationService, PaymentService, RegistrationService, WaitlistManager};
use sqlx::PgPool;
use std::sync::Arc;

/// Application state shared across all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Persistence seam, for read-side queries
    pub store: Arc<dyn AdmissionStore>,

    /// Registration transaction manager
    pub registration: Arc<RegistrationService>,

    /// Payment checkout/confirmation service
    pub payments: Arc<PaymentService>,

    /// Cancellation and voucher issuer
    pub cancellation: Arc<CancellationService>,

    /// Waitlist manager
    pub waitlist: Arc<WaitlistManager>,

    /// Clock used for "today" computations in handlers
    pub clock: Arc<dyn Clock>,

    /// Venue time zone
    pub time_zone: Tz,

    /// Database pool, for readiness checks
    pub pool: PgPool,
}
