//! Cancellation and voucher issuance.
//!
//! Transitions a registered participant to `Canceled`, kicks off the
//! waitlist promote scan for the freed slot, and, when the cancellation
//! happens strictly more than the cutoff before the event's local start,
//! issues a single-use goodwill voucher sized to the person's paid share.
//! Voucher and notification failures never fail the cancellation itself.

use crate::environment::Clock;
use crate::error::CancellationError;
use crate::notification::{Notification, Notifier, Recipient};
use crate::payment::{PaymentGateway, VoucherOrder};
use crate::policy::CancellationPolicy;
use crate::store::AdmissionStore;
use crate::types::{Event, EventId, PersonId, Voucher};
use crate::waitlist::WaitlistManager;
use chrono::{DateTime, Months, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

/// Result of a cancellation
#[derive(Clone, Debug)]
pub struct CancellationOutcome {
    /// The goodwill voucher, present only for timely cancellations with
    /// a recoverable paid share
    pub voucher: Option<Voucher>,
}

/// Cancels registrations and issues goodwill vouchers
pub struct CancellationService {
    store: Arc<dyn AdmissionStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    waitlist: Arc<WaitlistManager>,
    clock: Arc<dyn Clock>,
    policy: CancellationPolicy,
}

impl CancellationService {
    /// Creates the service
    #[must_use]
    pub const fn new(
        store: Arc<dyn AdmissionStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        waitlist: Arc<WaitlistManager>,
        clock: Arc<dyn Clock>,
        policy: CancellationPolicy,
    ) -> Self {
        Self { store, gateway, notifier, waitlist, clock, policy }
    }

    /// Cancels the person's registered participation in an event.
    ///
    /// The participant row is kept (status `Canceled`, timestamp set);
    /// the waitlist scan for the freed slot runs as a detached task; a
    /// voucher is attached when the cancellation was timely.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveRegistration` if the person holds no registered
    /// participation, `EventNotFound`, or `Storage`. Voucher issuance and
    /// notification failures are swallowed.
    pub async fn cancel(
        &self,
        person_id: PersonId,
        event_id: EventId,
    ) -> Result<CancellationOutcome, CancellationError> {
        let participant = self
            .store
            .find_registered_participant(person_id, event_id)
            .await?
            .ok_or(CancellationError::NoActiveRegistration)?;
        let event =
            self.store.event(event_id).await?.ok_or(CancellationError::EventNotFound(event_id))?;

        let now = self.clock.now();
        let timely = self.is_timely(&event, now);

        self.store.cancel_participant(participant.id, now).await?;
        tracing::info!(
            %event_id,
            %person_id,
            participant_id = %participant.id,
            timely,
            "registration cancelled"
        );

        // A slot may have freed up: re-open the opportunity for the
        // bracket's waitlist without blocking this request.
        let waitlist = Arc::clone(&self.waitlist);
        let bracket = participant.bracket;
        tokio::spawn(async move {
            if let Err(err) = waitlist.promote_scan(event_id, bracket).await {
                tracing::warn!(%event_id, %bracket, error = %err, "waitlist promote scan failed");
            }
        });

        let voucher =
            if timely { self.issue_voucher(person_id, &event, now).await } else { None };

        let notification = Notification::CancellationConfirmed {
            recipient: Recipient::for_participant(&participant),
            tagline: event.tagline.clone(),
            voucher: voucher.as_ref().map(|v| (v.code.clone(), v.expires_at)),
        };
        if let Err(err) = self.notifier.send(notification).await {
            tracing::warn!(%event_id, %person_id, error = %err, "cancellation mail failed");
        }

        Ok(CancellationOutcome { voucher })
    }

    /// Whether `now` is strictly more than the cutoff before the event's
    /// local start. Exactly at the cutoff counts as not timely.
    fn is_timely(&self, event: &Event, now: DateTime<Utc>) -> bool {
        event
            .start_instant(self.policy.venue_time_zone)
            .is_some_and(|start| (start - now).num_seconds() > self.policy.cutoff_hours * 3600)
    }

    /// Issues the goodwill voucher for a timely cancellation. Any failure
    /// is logged and yields `None`; the cancellation stands either way.
    async fn issue_voucher(
        &self,
        person_id: PersonId,
        event: &Event,
        now: DateTime<Utc>,
    ) -> Option<Voucher> {
        let paid = match self.store.find_paid_payment(person_id, event.id).await {
            Ok(Some(payment)) => payment,
            Ok(None) => {
                tracing::info!(%person_id, event_id = %event.id, "no paid transaction, no voucher");
                return None;
            }
            Err(err) => {
                tracing::warn!(%person_id, event_id = %event.id, error = %err, "voucher lookup failed");
                return None;
            }
        };

        // Only this person's share of the transaction is credited: a
        // payment covering a companion is split per head.
        let share = paid.amount.per_person_share(paid.covered_participants());
        if share.is_zero() {
            return None;
        }

        let expires_at =
            now.checked_add_months(Months::new(self.policy.voucher_validity_months)).unwrap_or(now);
        let code = voucher_code();
        let order = VoucherOrder {
            code: code.clone(),
            amount: share,
            currency: self.policy.voucher_currency.clone(),
            redeem_by: expires_at,
            person_id,
            name: format!("Voucher - {}", event.tagline),
        };

        if let Err(err) = self.gateway.issue_voucher(&order).await {
            tracing::error!(%person_id, event_id = %event.id, error = %err, "voucher creation failed");
            return None;
        }

        let voucher = Voucher {
            code,
            person_id,
            event_id: event.id,
            amount: share,
            currency: self.policy.voucher_currency.clone(),
            expires_at,
            redeemed: false,
        };
        // The collaborator owns redemption; the local record is
        // bookkeeping and must not void an already-issued voucher.
        if let Err(err) = self.store.record_voucher(&voucher).await {
            tracing::warn!(code = %voucher.code, error = %err, "voucher issued but not recorded");
        }
        Some(voucher)
    }
}

/// Generates a `MEET-XXXXXXXX` redemption code
fn voucher_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String =
        (0..8).map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase()).collect();
    format!("MEET-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voucher_codes_have_the_expected_shape() {
        let code = voucher_code();
        assert!(code.starts_with("MEET-"));
        assert_eq!(code.len(), 13);
        assert!(code[5..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
