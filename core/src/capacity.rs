//! Capacity monitor.
//!
//! After a party becomes `Registered`, checks whether the event crossed
//! the warning threshold and, exactly once per event, alerts the
//! operational administrators. The one-shot flag is claimed *before*
//! dispatch, so retries and concurrent confirmations can never produce a
//! second warning.

use crate::error::StoreError;
use crate::notification::{Notification, Notifier, Recipient};
use crate::store::AdmissionStore;
use crate::types::EventId;
use std::sync::Arc;

/// Fires the one-time capacity warning for events nearing full
pub struct CapacityMonitor {
    store: Arc<dyn AdmissionStore>,
    notifier: Arc<dyn Notifier>,
    warning_percent: u32,
}

impl CapacityMonitor {
    /// Creates the monitor. `warning_percent` is the capacity percentage
    /// at which the warning fires (90 in production).
    #[must_use]
    pub const fn new(
        store: Arc<dyn AdmissionStore>,
        notifier: Arc<dyn Notifier>,
        warning_percent: u32,
    ) -> Self {
        Self { store, notifier, warning_percent }
    }

    /// Re-checks an event's fill level. Returns `true` if this call
    /// claimed the one-shot flag and dispatched the warning.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure; callers run this as a
    /// fire-and-forget task and only log the error.
    pub async fn check(&self, event_id: EventId) -> Result<bool, StoreError> {
        let Some(event) = self.store.event(event_id).await? else {
            return Ok(false);
        };
        let capacity = event.capacity();
        if capacity == 0 {
            return Ok(false);
        }

        let registered = self.store.registered_count(event_id).await?;
        if u64::from(registered) * 100 < u64::from(capacity) * u64::from(self.warning_percent) {
            return Ok(false);
        }

        // Claim the flag first: at most one warning per event, even when
        // several confirmations cross the threshold at the same time.
        if !self.store.claim_capacity_warning(event_id).await? {
            return Ok(false);
        }

        let operators = self.store.operators().await?;
        for operator in &operators {
            let notification = Notification::CapacityWarning {
                recipient: Recipient::for_person(operator),
                tagline: event.tagline.clone(),
                event_date: event.date,
                registered,
                capacity,
            };
            if let Err(err) = self.notifier.send(notification).await {
                tracing::warn!(
                    %event_id,
                    operator = %operator.email,
                    error = %err,
                    "capacity warning delivery failed"
                );
            }
        }

        tracing::info!(%event_id, registered, capacity, "capacity warning dispatched");
        Ok(true)
    }
}
