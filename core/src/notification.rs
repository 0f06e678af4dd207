//! Notification collaborator interface.
//!
//! Outbound templated messages are fire-and-forget: senders log delivery
//! failures and never let them affect the primary operation's outcome.

use crate::types::{Money, PaymentId};
use chrono::{DateTime, NaiveDate, Utc};
use std::future::Future;
use std::pin::Pin;

/// Notification delivery error
#[derive(Debug, Clone, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Who a notification goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Email address
    pub email: String,
    /// Display name used in the salutation
    pub name: String,
    /// Template locale
    pub locale: String,
}

impl Recipient {
    /// Addresses a person record
    #[must_use]
    pub fn for_person(person: &crate::types::Person) -> Self {
        Self {
            email: person.email.clone(),
            name: person.full_name(),
            locale: person.locale.clone(),
        }
    }

    /// Addresses a participant row using the contact details entered at
    /// registration
    #[must_use]
    pub fn for_participant(participant: &crate::types::Participant) -> Self {
        Self {
            email: participant.email.clone(),
            name: format!("{} {}", participant.first_name, participant.last_name),
            locale: "en".to_string(),
        }
    }
}

/// Templated notifications the engine dispatches
#[derive(Debug, Clone)]
pub enum Notification {
    /// A waitlisted person is invited to complete payment for a freed slot
    WaitlistSlotAvailable {
        /// Addressee
        recipient: Recipient,
        /// Payment to complete
        payment_id: PaymentId,
        /// Amount owed
        amount: Money,
    },
    /// A participant's registration is confirmed after payment
    RegistrationConfirmed {
        /// Addressee
        recipient: Recipient,
        /// Event city, used in the subject line
        city: String,
        /// Event date
        event_date: NaiveDate,
    },
    /// An invited companion without an account is invited to join
    CompanionInvite {
        /// Addressee
        recipient: Recipient,
        /// Event city
        city: String,
        /// Event date
        event_date: NaiveDate,
    },
    /// A cancellation is confirmed, with the voucher code if one was issued
    CancellationConfirmed {
        /// Addressee
        recipient: Recipient,
        /// Event tagline
        tagline: String,
        /// Voucher code and expiry, when the cancellation was timely
        voucher: Option<(String, DateTime<Utc>)>,
    },
    /// Operators are warned that an event crossed the capacity threshold
    CapacityWarning {
        /// Addressee
        recipient: Recipient,
        /// Event tagline
        tagline: String,
        /// Event date
        event_date: NaiveDate,
        /// Current registered count
        registered: u32,
        /// Total capacity
        capacity: u32,
    },
}

impl Notification {
    /// The notification's addressee
    #[must_use]
    pub const fn recipient(&self) -> &Recipient {
        match self {
            Self::WaitlistSlotAvailable { recipient, .. }
            | Self::RegistrationConfirmed { recipient, .. }
            | Self::CompanionInvite { recipient, .. }
            | Self::CancellationConfirmed { recipient, .. }
            | Self::CapacityWarning { recipient, .. } => recipient,
        }
    }

    /// Template name, mirroring the mail templates in production
    #[must_use]
    pub const fn template(&self) -> &'static str {
        match self {
            Self::WaitlistSlotAvailable { .. } => "waitlist_slot_available",
            Self::RegistrationConfirmed { .. } => "event_registered",
            Self::CompanionInvite { .. } => "companion_invite",
            Self::CancellationConfirmed { .. } => "event_cancelled",
            Self::CapacityWarning { .. } => "capacity_warning",
        }
    }
}

/// Notification collaborator trait
pub trait Notifier: Send + Sync {
    /// Dispatches one notification, best-effort.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; callers log and move on.
    fn send(
        &self,
        notification: Notification,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>>;
}
