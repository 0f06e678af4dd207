//! Payment API endpoints.
//!
//! - GET /api/payments/:id/slot - Re-check whether the party still fits
//! - POST /api/payments/:id/checkout - Prepare the charge (optional coupon)
//! - POST /api/payments/:id/confirm - Collaborator success callback

use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use meetlocal_core::payments::{CheckoutOutcome, ConfirmationOutcome, SlotAvailability};
use meetlocal_core::types::PaymentId;
use metrics::counter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to prepare a charge
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    /// Optional coupon code
    pub coupon: Option<String>,
}

/// Price breakdown shown to the client, decimal euros
#[derive(Debug, Serialize)]
pub struct PriceResponse {
    /// Amount before any discount
    pub original: String,
    /// Discount granted by the coupon
    pub discount: String,
    /// Amount actually due
    #[serde(rename = "final")]
    pub final_amount: String,
}

/// Response after preparing a charge
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Whether the client still has to complete a charge
    pub requires_payment_action: bool,
    /// Secret for the collaborator's client SDK, when a charge is needed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Settlement status, when the payment finalized free of charge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    /// Price breakdown
    pub price: PriceResponse,
}

/// Settlement status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// `confirmed`, `waitlisted`, `paid` or `available`
    pub status: &'static str,
}

const fn confirmation_label(outcome: ConfirmationOutcome) -> &'static str {
    match outcome {
        ConfirmationOutcome::Confirmed => "confirmed",
        ConfirmationOutcome::AlreadyPaid => "already_paid",
        ConfirmationOutcome::Waitlisted => "waitlisted",
    }
}

/// Re-check whether a pending party still has room before paying.
///
/// A party that no longer fits is moved to the waitlist here, mirroring
/// what confirmation would decide.
pub async fn check_slot(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let availability = state.payments.slot_check(PaymentId::from_uuid(payment_id)).await?;
    let status = match availability {
        SlotAvailability::Available => "available",
        SlotAvailability::Waitlisted => "waitlisted",
        SlotAvailability::AlreadyPaid => "paid",
    };
    Ok(Json(StatusResponse { status }))
}

/// Prepare the charge for a pending payment.
///
/// Applies an optional coupon; a total below the collaborator's minimum
/// charge finalizes the payment immediately with no charge.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/payments/<id>/checkout \
///   -H "Content-Type: application/json" \
///   -d '{"coupon": "MEET-9F3K2B7A"}'
/// ```
pub async fn checkout(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    payload: Option<Json<CheckoutRequest>>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let coupon = payload.and_then(|Json(request)| request.coupon);
    let outcome = state
        .payments
        .checkout(PaymentId::from_uuid(payment_id), coupon.as_deref())
        .await?;

    let response = match outcome {
        CheckoutOutcome::Finalized { price, confirmation } => {
            counter!("meetlocal_payments_total", "outcome" => "finalized_free").increment(1);
            CheckoutResponse {
                requires_payment_action: false,
                client_secret: None,
                status: Some(confirmation_label(confirmation)),
                price: price_response(price),
            }
        }
        CheckoutOutcome::RequiresPayment { price, client_secret } => CheckoutResponse {
            requires_payment_action: true,
            client_secret: Some(client_secret),
            status: None,
            price: price_response(price),
        },
    };
    Ok(Json(response))
}

/// Settle a payment after the collaborator reports success.
///
/// Runs the late capacity/ratio re-check: the party is either registered
/// or routed to the waitlist.
pub async fn confirm(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let outcome = state.payments.confirm(PaymentId::from_uuid(payment_id)).await?;
    let status = confirmation_label(outcome);
    counter!("meetlocal_payments_total", "outcome" => status).increment(1);
    Ok(Json(StatusResponse { status }))
}

fn price_response(price: meetlocal_core::payments::PriceBreakdown) -> PriceResponse {
    PriceResponse {
        original: price.original.to_euro_string(),
        discount: price.discount.to_euro_string(),
        final_amount: price.due.to_euro_string(),
    }
}
