//! Error taxonomy of the admission engine.
//!
//! Validation-class errors are detected before any write and carry a
//! specific reason; persistence-class errors abort the whole transaction
//! and surface as an opaque storage failure. Ratio contention is *not* an
//! error: it routes the request to the waitlist.

use crate::types::{AgeBracket, EventId, PaymentId};
use thiserror::Error;

/// Which member of a registering party a validation error refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartyRole {
    /// The registering person
    Primary,
    /// The invited companion
    Companion,
}

impl std::fmt::Display for PartyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => f.write_str("primary registrant"),
            Self::Companion => f.write_str("companion"),
        }
    }
}

/// Failures of a registration request.
///
/// All variants except `Storage` are detected before any state is created.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The event does not exist
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// The event is a draft or has been cancelled
    #[error("event is not open for registration")]
    EventNotOpen,

    /// The event has reached its seat capacity
    #[error("event is full, no more registrations allowed")]
    CapacityExceeded,

    /// The person already holds an active registration for this event
    /// and bracket
    #[error("an active registration already exists for this event and bracket")]
    DuplicateRegistration,

    /// The companion's email matches the primary registrant's
    #[error("companion must be a different person than the primary registrant")]
    CompanionConflict,

    /// A party member's age falls outside the requested bracket
    #[error("{role} (age {age}) is outside the {bracket} bracket")]
    AgeBracketMismatch {
        /// Member the mismatch applies to
        role: PartyRole,
        /// Computed age in whole years
        age: i32,
        /// The requested bracket
        bracket: AgeBracket,
    },

    /// The atomic create sequence failed and was rolled back
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Failures of the payment checkout/confirmation flow
#[derive(Debug, Error)]
pub enum PaymentError {
    /// No pending payment with the given id
    #[error("payment {0} not found")]
    PaymentNotFound(PaymentId),

    /// The payment's event no longer exists
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// The event date has already passed
    #[error("event has already been held")]
    EventAlreadyHeld,

    /// The event has reached its seat capacity
    #[error("event is full, no more registrations allowed")]
    CapacityExceeded,

    /// The payment was already confirmed
    #[error("payment {0} has already been settled")]
    AlreadyPaid(PaymentId),

    /// The payment collaborator refused the operation
    #[error("payment collaborator error: {0}")]
    Gateway(String),

    /// Storage failure; the transaction was rolled back
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Failures of a cancellation request
#[derive(Debug, Error)]
pub enum CancellationError {
    /// The person holds no registered participation for this event
    #[error("no registered participation found for this event")]
    NoActiveRegistration,

    /// The event does not exist
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Persistence-layer failure. Carries no domain meaning; callers roll back
/// and surface an opaque error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced entity does not exist
    #[error("{entity} not found")]
    NotFound {
        /// Entity kind, e.g. `"event"`
        entity: &'static str,
    },

    /// Backend failure (connection, constraint, serialization, ...)
    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Convenience constructor for backend failures
    #[must_use]
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}
