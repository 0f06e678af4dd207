//! Router configuration for the MeetLocal API.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{cancellations, events, payments, registrations};
use axum::{
    routing::{get, post},
    Router,
};

/// Build the complete Axum router.
///
/// - Health checks (no authentication)
/// - Event management and availability queries
/// - Registration, payment and cancellation flows
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Event management
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/availability", get(events::get_availability))
        // Cancellation flow
        .route("/events/:id/cancellation", post(cancellations::cancel_registration))
        // Registration flow
        .route("/registrations", post(registrations::create_registration))
        // Payment flow
        .route("/payments/:id/slot", get(payments::check_slot))
        .route("/payments/:id/checkout", post(payments::checkout))
        .route("/payments/:id/confirm", post(payments::confirm));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .with_state(state)
}
