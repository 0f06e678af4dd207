//! Cancellation API endpoint.
//!
//! - POST /api/events/:id/cancellation - Cancel a registered participation
//!
//! A timely cancellation (strictly more than 24h before the event's local
//! start) yields a single-use goodwill voucher sized to the person's paid
//! share. The freed slot triggers a waitlist promote scan in the
//! background.

use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use meetlocal_core::types::{EventId, PersonId};
use metrics::counter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to cancel a registered participation
#[derive(Debug, Deserialize)]
pub struct CancelRegistrationRequest {
    /// The cancelling person
    pub person_id: Uuid,
}

/// An issued goodwill voucher
#[derive(Debug, Serialize)]
pub struct VoucherResponse {
    /// Single-use redemption code
    pub code: String,
    /// Credit amount, decimal euros
    pub amount: String,
    /// Expiry instant
    pub expires_at: DateTime<Utc>,
}

/// Response after a cancellation
#[derive(Debug, Serialize)]
pub struct CancelRegistrationResponse {
    /// Always true on success
    pub canceled: bool,
    /// The voucher, when the cancellation was timely
    pub voucher: Option<VoucherResponse>,
}

/// Cancel the person's registered participation in an event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events/<id>/cancellation \
///   -H "Content-Type: application/json" \
///   -d '{"person_id": "770e8400-e29b-41d4-a716-446655440002"}'
/// ```
pub async fn cancel_registration(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<CancelRegistrationRequest>,
) -> Result<Json<CancelRegistrationResponse>, AppError> {
    let outcome = state
        .cancellation
        .cancel(PersonId::from_uuid(payload.person_id), EventId::from_uuid(event_id))
        .await?;

    let with_voucher = if outcome.voucher.is_some() { "true" } else { "false" };
    counter!("meetlocal_cancellations_total", "voucher" => with_voucher).increment(1);

    Ok(Json(CancelRegistrationResponse {
        canceled: true,
        voucher: outcome.voucher.map(|voucher| VoucherResponse {
            code: voucher.code,
            amount: voucher.amount.to_euro_string(),
            expires_at: voucher.expires_at,
        }),
    }))
}
