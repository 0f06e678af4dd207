//! Payment checkout and confirmation.
//!
//! The payment collaborator drives the `paid` transition; this service
//! owns everything around it: coupon arithmetic, the free-checkout path
//! for totals below the collaborator's minimum charge, the late
//! capacity/ratio re-check that can still route a party to the waitlist
//! at settlement time, and the post-commit side effects (confirmation
//! notifications, capacity monitor).

use crate::admission::AdmissionEvaluator;
use crate::capacity::CapacityMonitor;
use crate::environment::Clock;
use crate::error::{PaymentError, StoreError};
use crate::notification::{Notification, Notifier, Recipient};
use crate::payment::PaymentGateway;
use crate::store::{AdmissionStore, PaymentSnapshot, PaymentUow};
use crate::types::{Money, ParticipantStatus, PaymentId};
use chrono_tz::Tz;
use std::sync::Arc;

/// Price breakdown of a checkout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceBreakdown {
    /// Amount before any discount
    pub original: Money,
    /// Discount granted by a coupon
    pub discount: Money,
    /// Amount actually due
    pub due: Money,
}

/// Outcome of a checkout request
#[derive(Clone, Debug)]
pub enum CheckoutOutcome {
    /// The total fell below the collaborator's minimum charge; the
    /// payment was finalized free of charge
    Finalized {
        /// Price breakdown shown to the client
        price: PriceBreakdown,
        /// What the finalization concluded
        confirmation: ConfirmationOutcome,
    },
    /// The client must complete the charge with the collaborator
    RequiresPayment {
        /// Price breakdown shown to the client
        price: PriceBreakdown,
        /// Secret the client passes to the collaborator
        client_secret: String,
    },
}

/// Outcome of a payment confirmation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The party is registered; seats are consumed
    Confirmed,
    /// The payment had already been settled earlier
    AlreadyPaid,
    /// The late re-check found no room; the party was routed to the
    /// waitlist instead
    Waitlisted,
}

/// Result of a slot re-check before the client attempts payment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotAvailability {
    /// The party still fits; payment may proceed
    Available,
    /// The party no longer fits and now waits for a slot
    Waitlisted,
    /// The payment was already settled
    AlreadyPaid,
}

/// Settles pending payments and runs their side effects
pub struct PaymentService {
    store: Arc<dyn AdmissionStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    evaluator: AdmissionEvaluator,
    monitor: Arc<CapacityMonitor>,
    clock: Arc<dyn Clock>,
    time_zone: Tz,
}

impl PaymentService {
    /// Creates the service
    #[must_use]
    pub const fn new(
        store: Arc<dyn AdmissionStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        evaluator: AdmissionEvaluator,
        monitor: Arc<CapacityMonitor>,
        clock: Arc<dyn Clock>,
        time_zone: Tz,
    ) -> Self {
        Self { store, gateway, notifier, evaluator, monitor, clock, time_zone }
    }

    /// Prepares a charge for a pending payment, applying an optional
    /// coupon. Totals below the collaborator's minimum charge finalize
    /// immediately without a charge.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound`, `AlreadyPaid`, `EventNotFound`,
    /// `EventAlreadyHeld`, `CapacityExceeded`, a gateway error for a
    /// refused charge, or `Storage`.
    pub async fn checkout(
        &self,
        payment_id: PaymentId,
        coupon: Option<&str>,
    ) -> Result<CheckoutOutcome, PaymentError> {
        let payment = self
            .store
            .payment(payment_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound(payment_id))?;
        if payment.status == crate::types::PaymentStatus::Paid {
            return Err(PaymentError::AlreadyPaid(payment_id));
        }

        let event = self
            .store
            .event(payment.event_id)
            .await?
            .ok_or(PaymentError::EventNotFound(payment.event_id))?;
        let today = self.clock.now().with_timezone(&self.time_zone).date_naive();
        if event.date < today {
            return Err(PaymentError::EventAlreadyHeld);
        }
        let registered = self.store.registered_count(payment.event_id).await?;
        if registered >= event.capacity() {
            return Err(PaymentError::CapacityExceeded);
        }

        let original = payment.amount;
        let discount = match coupon {
            Some(code) => match self.gateway.compute_discount(code, original).await {
                Ok(discount) => discount,
                Err(err) => {
                    // Invalid or failing coupons never block a checkout.
                    tracing::warn!(%payment_id, error = %err, "coupon validation failed");
                    None
                }
            },
            None => None,
        };

        let amount_off = discount.as_ref().map_or(Money::ZERO, |d| d.amount_off);
        let due = original.saturating_sub(amount_off);
        let price = PriceBreakdown { original, discount: amount_off, due };

        if due < self.evaluator.policy().min_charge {
            if let Some(coupon) = &discount {
                if let Err(err) =
                    self.gateway.redeem_coupon(&coupon.promo_id, payment.payer_id).await
                {
                    tracing::warn!(%payment_id, error = %err, "manual coupon redemption failed");
                }
            }
            let confirmation = self.confirm(payment_id).await?;
            return Ok(CheckoutOutcome::Finalized { price, confirmation });
        }

        let intent = self
            .gateway
            .create_charge(payment_id, due)
            .await
            .map_err(|err| PaymentError::Gateway(err.to_string()))?;
        Ok(CheckoutOutcome::RequiresPayment { price, client_secret: intent.client_secret })
    }

    /// Settles a payment after the collaborator reports success.
    ///
    /// Runs the late capacity/ratio re-check under the event lock: a
    /// party that no longer fits is routed to the waitlist instead of
    /// registered, preserving the capacity invariant.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` or `Storage`; on `Storage` the whole
    /// settlement has been rolled back.
    pub async fn confirm(&self, payment_id: PaymentId) -> Result<ConfirmationOutcome, PaymentError> {
        let mut uow = self.store.begin_payment(payment_id).await.map_err(|err| match err {
            StoreError::NotFound { .. } => PaymentError::PaymentNotFound(payment_id),
            other => PaymentError::Storage(other),
        })?;
        let snapshot = uow.snapshot().clone();

        if snapshot.payment.status == crate::types::PaymentStatus::Paid {
            return Ok(ConfirmationOutcome::AlreadyPaid);
        }

        if !self.party_fits(&snapshot) {
            uow.set_party_status(ParticipantStatus::Waitlisted).await?;
            uow.ensure_waitlist_entry().await?;
            uow.commit().await?;
            tracing::info!(%payment_id, "no room at settlement time, party waitlisted");
            return Ok(ConfirmationOutcome::Waitlisted);
        }

        uow.mark_paid().await?;
        uow.set_party_status(ParticipantStatus::Registered).await?;
        uow.remove_party_waitlist_entries().await?;
        uow.commit().await?;

        tracing::info!(
            %payment_id,
            event_id = %snapshot.event.id,
            amount = %snapshot.payment.amount,
            "payment settled, party registered"
        );
        self.dispatch_confirmation_effects(snapshot);
        Ok(ConfirmationOutcome::Confirmed)
    }

    /// Re-checks whether a pending party still has room before the
    /// client attempts payment, moving it to the waitlist if not.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` or `Storage`.
    pub async fn slot_check(&self, payment_id: PaymentId) -> Result<SlotAvailability, PaymentError> {
        let mut uow = self.store.begin_payment(payment_id).await.map_err(|err| match err {
            StoreError::NotFound { .. } => PaymentError::PaymentNotFound(payment_id),
            other => PaymentError::Storage(other),
        })?;
        let snapshot = uow.snapshot().clone();

        if snapshot.payment.status == crate::types::PaymentStatus::Paid {
            return Ok(SlotAvailability::AlreadyPaid);
        }
        if self.party_fits(&snapshot) {
            // Read-only path: dropping the unit of work releases the lock.
            return Ok(SlotAvailability::Available);
        }

        let already_waitlisted = snapshot
            .participants
            .iter()
            .all(|p| p.status == ParticipantStatus::Waitlisted);
        if !already_waitlisted {
            uow.set_party_status(ParticipantStatus::Waitlisted).await?;
            uow.ensure_waitlist_entry().await?;
            uow.commit().await?;
        }
        Ok(SlotAvailability::Waitlisted)
    }

    /// Capacity and ratio re-check for a pending party at settlement time
    fn party_fits(&self, snapshot: &PaymentSnapshot) -> bool {
        let party = snapshot.payment.covered_participants();
        if snapshot.registered_count + party > snapshot.event.capacity() {
            return false;
        }

        let Some(primary) = snapshot.participants.first() else {
            return false;
        };
        let companion_gender = snapshot.participants.get(1).map(|p| p.gender);
        self.evaluator.ratio_permits(snapshot.bracket, primary.gender, companion_gender)
    }

    /// Post-commit side effects: confirmation mails for the whole party,
    /// a join invitation for the companion, and the capacity monitor.
    /// Fire-and-forget; failures are logged and never surface.
    fn dispatch_confirmation_effects(&self, snapshot: PaymentSnapshot) {
        let notifier = Arc::clone(&self.notifier);
        let monitor = Arc::clone(&self.monitor);
        let event_id = snapshot.event.id;

        tokio::spawn(async move {
            for participant in &snapshot.participants {
                let recipient = Recipient::for_participant(participant);
                let confirmed = Notification::RegistrationConfirmed {
                    recipient: recipient.clone(),
                    city: snapshot.event.city.clone(),
                    event_date: snapshot.event.date,
                };
                if let Err(err) = notifier.send(confirmed).await {
                    tracing::warn!(%event_id, error = %err, "confirmation mail failed");
                }

                if !participant.is_primary {
                    let invite = Notification::CompanionInvite {
                        recipient,
                        city: snapshot.event.city.clone(),
                        event_date: snapshot.event.date,
                    };
                    if let Err(err) = notifier.send(invite).await {
                        tracing::warn!(%event_id, error = %err, "companion invite failed");
                    }
                }
            }

            if let Err(err) = monitor.check(event_id).await {
                tracing::warn!(%event_id, error = %err, "capacity monitor check failed");
            }
        });
    }
}
