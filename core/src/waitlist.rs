//! Waitlist manager.
//!
//! Persists deferred registrations and re-opens the payment opportunity
//! when a slot frees up. Promotion never registers anyone directly:
//! payment completion remains the gate, the scan only invites the
//! earliest-queued entrants to complete it.

use crate::error::StoreError;
use crate::notification::{Notification, Notifier, Recipient};
use crate::policy::AdmissionPolicy;
use crate::store::{AdmissionStore, NewPayment, NewWaitlistEntry};
use crate::types::{AgeBracket, EventId, Money};
use std::sync::Arc;

/// Manages the per-event, per-bracket waitlist queue
pub struct WaitlistManager {
    store: Arc<dyn AdmissionStore>,
    notifier: Arc<dyn Notifier>,
    policy: AdmissionPolicy,
}

impl WaitlistManager {
    /// Creates the manager
    #[must_use]
    pub const fn new(
        store: Arc<dyn AdmissionStore>,
        notifier: Arc<dyn Notifier>,
        policy: AdmissionPolicy,
    ) -> Self {
        Self { store, notifier, policy }
    }

    /// Enqueues a party. A no-op if the person already waits on this
    /// event and bracket.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    pub async fn enqueue(&self, entry: NewWaitlistEntry) -> Result<(), StoreError> {
        self.store.insert_waitlist_entry(entry).await
    }

    /// Re-scans the waitlist for an event and bracket after a slot freed
    /// up, inviting every queued party (oldest first) to complete
    /// payment. Reuses a matching unpaid payment when one exists so a
    /// repeated scan never duplicates obligations.
    ///
    /// Failures for individual entries are logged and skipped; the scan
    /// is safe to retry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` only if the queue itself cannot be read.
    pub async fn promote_scan(
        &self,
        event_id: EventId,
        bracket: AgeBracket,
    ) -> Result<u32, StoreError> {
        let entries = self.store.waitlist_entries(event_id, bracket).await?;
        let mut invited = 0;

        for entry in entries {
            let amount = Money::from_cents(
                self.policy.base_fee.cents().saturating_mul(u64::from(entry.party_size())),
            );

            let payment_id = match self.store.find_reusable_unpaid_payment(&entry, amount).await {
                Ok(Some(existing)) => existing.id,
                Ok(None) => {
                    match self
                        .store
                        .create_payment(NewPayment {
                            event_id: entry.event_id,
                            payer_id: entry.person_id,
                            participant_id: entry.participant_id,
                            companion_participant_ids: entry
                                .companion_participant_id
                                .into_iter()
                                .collect(),
                            amount,
                        })
                        .await
                    {
                        Ok(id) => id,
                        Err(err) => {
                            tracing::warn!(
                                entry_id = %entry.id,
                                error = %err,
                                "skipping waitlist entry, could not create payment"
                            );
                            continue;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(entry_id = %entry.id, error = %err, "skipping waitlist entry");
                    continue;
                }
            };

            let Some(person) = self.store.person(entry.person_id).await.ok().flatten() else {
                tracing::warn!(entry_id = %entry.id, "skipping waitlist entry, person missing");
                continue;
            };

            let notification = Notification::WaitlistSlotAvailable {
                recipient: Recipient::for_person(&person),
                payment_id,
                amount,
            };
            match self.notifier.send(notification).await {
                Ok(()) => invited += 1,
                Err(err) => {
                    tracing::warn!(
                        entry_id = %entry.id,
                        error = %err,
                        "waitlist availability notification failed"
                    );
                }
            }
        }

        tracing::info!(%event_id, %bracket, invited, "waitlist promote scan finished");
        Ok(invited)
    }
}
