//! Registration transaction manager.
//!
//! Orchestrates one registration request as a single atomic unit: the
//! admission decision is evaluated against a snapshot read under the
//! event lock, then the participant row(s) and either a pending payment
//! (admit) or a waitlist entry (waitlist) are staged and committed
//! together. Any failure mid-sequence drops the unit of work and nothing
//! persists.

use crate::admission::{Admission, AdmissionEvaluator};
use crate::environment::Clock;
use crate::error::{AdmissionError, StoreError};
use crate::store::{AdmissionStore, NewParticipant, NewPayment, NewPerson, NewWaitlistEntry};
use crate::types::{
    Money, ParticipantStatus, PartyMember, PersonId, RegistrationOutcome, RegistrationRequest,
};
use chrono_tz::Tz;
use std::sync::Arc;

/// Default locale for persons created on behalf of invited companions
const INVITED_LOCALE: &str = "en";

/// Handles registration requests end to end
pub struct RegistrationService {
    store: Arc<dyn AdmissionStore>,
    evaluator: AdmissionEvaluator,
    clock: Arc<dyn Clock>,
    time_zone: Tz,
}

impl RegistrationService {
    /// Creates the service
    #[must_use]
    pub const fn new(
        store: Arc<dyn AdmissionStore>,
        evaluator: AdmissionEvaluator,
        clock: Arc<dyn Clock>,
        time_zone: Tz,
    ) -> Self {
        Self { store, evaluator, clock, time_zone }
    }

    /// Registers a party (primary registrant plus optional companion)
    /// for an event.
    ///
    /// Returns `PaymentRequired` when the party is admitted and
    /// `Waitlisted` when the gender ratio routes it to the waitlist.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any write (capacity, duplicate,
    /// age bracket, companion conflict, closed event), or `Storage` if
    /// the atomic create sequence fails, in which case every staged
    /// write has been rolled back.
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, AdmissionError> {
        let mut uow = self
            .store
            .begin_registration(request.event_id, request.person_id, request.bracket)
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => AdmissionError::EventNotFound(request.event_id),
                other => AdmissionError::Storage(other),
            })?;

        let today = self.clock.now().with_timezone(&self.time_zone).date_naive();
        let admission = self.evaluator.evaluate(uow.snapshot(), &request, today)?;
        let status = match admission {
            Admission::Admit => ParticipantStatus::AwaitingPayment,
            Admission::Waitlist => ParticipantStatus::Waitlisted,
        };

        // The companion row goes in first so the payment can reference it.
        let companion = match &request.companion {
            Some(member) => {
                let person_id = uow
                    .find_or_create_person(NewPerson {
                        email: member.email.clone(),
                        first_name: member.first_name.clone(),
                        last_name: member.last_name.clone(),
                        locale: INVITED_LOCALE.to_string(),
                    })
                    .await?;
                let participant_id = uow
                    .insert_participant(new_participant(&request, member, person_id, false, status))
                    .await?;
                Some((person_id, participant_id))
            }
            None => None,
        };

        let primary_id = uow
            .insert_participant(new_participant(
                &request,
                &request.primary,
                request.person_id,
                true,
                status,
            ))
            .await?;
        uow.update_person_preferences(request.person_id, &request.primary.preferences).await?;

        match admission {
            Admission::Waitlist => {
                uow.insert_waitlist_entry(NewWaitlistEntry {
                    event_id: request.event_id,
                    bracket: request.bracket,
                    person_id: request.person_id,
                    participant_id: primary_id,
                    companion_person_id: companion.map(|(person, _)| person),
                    companion_participant_id: companion.map(|(_, participant)| participant),
                })
                .await?;
                uow.commit().await?;

                tracing::info!(
                    event_id = %request.event_id,
                    person_id = %request.person_id,
                    bracket = %request.bracket,
                    "registration deferred to waitlist"
                );
                Ok(RegistrationOutcome::Waitlisted)
            }
            Admission::Admit => {
                let amount = self.party_fee(request.party_size());
                let payment_id = uow
                    .insert_payment(NewPayment {
                        event_id: request.event_id,
                        payer_id: request.person_id,
                        participant_id: primary_id,
                        companion_participant_ids: companion
                            .map(|(_, participant)| participant)
                            .into_iter()
                            .collect(),
                        amount,
                    })
                    .await?;
                uow.commit().await?;

                tracing::info!(
                    event_id = %request.event_id,
                    person_id = %request.person_id,
                    payment_id = %payment_id,
                    amount = %amount,
                    "registration admitted, payment pending"
                );
                Ok(RegistrationOutcome::PaymentRequired { payment_id, amount })
            }
        }
    }

    /// The fee owed by a party of the given size
    #[must_use]
    pub fn party_fee(&self, party_size: u32) -> Money {
        Money::from_cents(
            self.evaluator.policy().base_fee.cents().saturating_mul(u64::from(party_size)),
        )
    }
}

/// Builds the participant row for one party member
fn new_participant(
    request: &RegistrationRequest,
    member: &PartyMember,
    person_id: PersonId,
    is_primary: bool,
    status: ParticipantStatus,
) -> NewParticipant {
    NewParticipant {
        event_id: request.event_id,
        person_id,
        first_name: member.first_name.clone(),
        last_name: member.last_name.clone(),
        email: member.email.clone(),
        gender: member.gender,
        birth_date: member.birth_date,
        bracket: request.bracket,
        is_primary,
        status,
        has_children: member.has_children,
        preferences: member.preferences.clone(),
    }
}
