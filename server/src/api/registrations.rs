//! Registration API endpoint.
//!
//! - POST /api/registrations - Register a party for an event
//!
//! # Registration Flow
//!
//! 1. **Admission**: capacity gate → duplicate check → age bracket →
//!    gender ratio, evaluated atomically with the writes
//! 2. **Admit**: participant row(s) plus one unpaid payment are created;
//!    the client completes the payment via the payment endpoints
//! 3. **Waitlist**: participant row(s) plus one waitlist entry are
//!    created; the client is invited back when a slot frees up

use crate::error::AppError;
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use meetlocal_core::types::{
    AgeBracket, EventId, Gender, PartyMember, PersonId, PreferenceProfile, RegistrationOutcome,
    RegistrationRequest,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One member of the registering party
#[derive(Debug, Deserialize)]
pub struct MemberPayload {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Contact email
    pub email: String,
    /// Gender
    pub gender: Gender,
    /// Birth date (`YYYY-MM-DD`)
    pub birth_date: NaiveDate,
    /// Whether the member has children
    #[serde(default)]
    pub has_children: bool,
    /// Matching preference answers
    #[serde(default)]
    pub preferences: PreferenceProfile,
}

impl MemberPayload {
    fn into_member(self) -> PartyMember {
        PartyMember {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            gender: self.gender,
            birth_date: self.birth_date,
            has_children: self.has_children,
            preferences: self.preferences,
        }
    }
}

/// Request to register a party for an event
#[derive(Debug, Deserialize)]
pub struct CreateRegistrationRequest {
    /// Event to register for
    pub event_id: Uuid,
    /// The registering person
    pub person_id: Uuid,
    /// Requested age bracket, e.g. `"31–40"`
    pub age_group: AgeBracket,
    /// The primary registrant's details
    pub primary: MemberPayload,
    /// Invited companion, if any
    pub companion: Option<MemberPayload>,
}

/// Response after a registration request
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationResponse {
    /// Admitted; complete the referenced payment to claim the seats
    PaymentRequired {
        /// Payment to complete
        payment_id: Uuid,
        /// Amount owed, decimal euros
        amount: String,
    },
    /// Deferred to the bracket's waitlist
    Waitlisted {
        /// Human-readable explanation
        message: String,
    },
}

/// Register a party for an event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/registrations \
///   -H "Content-Type: application/json" \
///   -d '{
///     "event_id": "550e8400-e29b-41d4-a716-446655440000",
///     "person_id": "770e8400-e29b-41d4-a716-446655440002",
///     "age_group": "31–40",
///     "primary": {
///       "first_name": "Mara", "last_name": "Weber",
///       "email": "mara@example.com", "gender": "female",
///       "birth_date": "1991-04-12"
///     },
///     "companion": null
///   }'
/// ```
pub async fn create_registration(
    State(state): State<AppState>,
    Json(payload): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), AppError> {
    let request = RegistrationRequest {
        event_id: EventId::from_uuid(payload.event_id),
        person_id: PersonId::from_uuid(payload.person_id),
        bracket: payload.age_group,
        primary: payload.primary.into_member(),
        companion: payload.companion.map(MemberPayload::into_member),
    };

    let outcome = state.registration.register(request).await?;
    let response = match outcome {
        RegistrationOutcome::PaymentRequired { payment_id, amount } => {
            counter!("meetlocal_registrations_total", "outcome" => "payment_required")
                .increment(1);
            RegistrationResponse::PaymentRequired {
                payment_id: *payment_id.as_uuid(),
                amount: amount.to_euro_string(),
            }
        }
        RegistrationOutcome::Waitlisted => {
            counter!("meetlocal_registrations_total", "outcome" => "waitlisted").increment(1);
            RegistrationResponse::Waitlisted {
                message: "All balanced seats are taken; you are on the waitlist for this bracket."
                    .to_string(),
            }
        }
    };
    Ok((StatusCode::CREATED, Json(response)))
}
