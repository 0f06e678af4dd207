//! Storage traits for the admission engine.
//!
//! The engine talks to persistence through two seams:
//!
//! - Plain queries and single-statement updates on [`AdmissionStore`].
//! - Multi-record atomic sequences through explicit units of work
//!   ([`RegistrationUow`], [`PaymentUow`]) with a single commit boundary.
//!   Creating a unit of work locks the event row, so the snapshot it
//!   exposes cannot go stale before the writes commit: concurrent
//!   decisions for the same event are serialized. Dropping a unit of work
//!   without committing rolls back every staged write.

use crate::admission::AdmissionSnapshot;
use crate::error::StoreError;
use crate::types::{
    AgeBracket, Event, EventId, Gender, Money, Participant, ParticipantId, ParticipantStatus,
    PaymentId, PendingPayment, Person, PersonId, PreferenceProfile, WaitlistEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Column values for a new participant row
#[derive(Clone, Debug)]
pub struct NewParticipant {
    /// Event registered for
    pub event_id: EventId,
    /// The person behind the registration
    pub person_id: PersonId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Contact email
    pub email: String,
    /// Gender
    pub gender: Gender,
    /// Birth date
    pub birth_date: NaiveDate,
    /// Age bracket
    pub bracket: AgeBracket,
    /// Primary registrant or companion
    pub is_primary: bool,
    /// Initial lifecycle status
    pub status: ParticipantStatus,
    /// Whether the person has children
    pub has_children: bool,
    /// Preference answers snapshot
    pub preferences: PreferenceProfile,
}

/// Column values for a new pending payment row
#[derive(Clone, Debug)]
pub struct NewPayment {
    /// Event the payment is for
    pub event_id: EventId,
    /// Person who owes the amount
    pub payer_id: PersonId,
    /// Primary participant covered
    pub participant_id: ParticipantId,
    /// Companion participants covered
    pub companion_participant_ids: Vec<ParticipantId>,
    /// Amount owed
    pub amount: Money,
}

/// Column values for a new waitlist entry
#[derive(Clone, Debug)]
pub struct NewWaitlistEntry {
    /// Event waited on
    pub event_id: EventId,
    /// Bracket waited on
    pub bracket: AgeBracket,
    /// Waiting person
    pub person_id: PersonId,
    /// Waiting person's participant row
    pub participant_id: ParticipantId,
    /// Companion's person, if any
    pub companion_person_id: Option<PersonId>,
    /// Companion's participant row, if any
    pub companion_participant_id: Option<ParticipantId>,
}

/// Column values for a person created on behalf of an invited companion
#[derive(Clone, Debug)]
pub struct NewPerson {
    /// Unique email address
    pub email: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Notification locale
    pub locale: String,
}

/// Atomic write sequence for one registration request.
///
/// All writes become visible together at [`commit`](Self::commit) or not
/// at all. The creating store holds the event admission lock for the
/// lifetime of this value.
#[async_trait]
pub trait RegistrationUow: Send {
    /// The admission snapshot read under the event lock
    fn snapshot(&self) -> &AdmissionSnapshot;

    /// Looks up a person by email, creating one for an invited companion
    /// if none exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn find_or_create_person(&mut self, person: NewPerson) -> Result<PersonId, StoreError>;

    /// Stages a participant row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn insert_participant(
        &mut self,
        participant: NewParticipant,
    ) -> Result<ParticipantId, StoreError>;

    /// Persists the primary registrant's latest preference answers onto
    /// their person record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn update_person_preferences(
        &mut self,
        person_id: PersonId,
        preferences: &PreferenceProfile,
    ) -> Result<(), StoreError>;

    /// Stages the pending payment for the party.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn insert_payment(&mut self, payment: NewPayment) -> Result<PaymentId, StoreError>;

    /// Stages a waitlist entry. A no-op if the person already waits on
    /// this event and bracket.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn insert_waitlist_entry(&mut self, entry: NewWaitlistEntry) -> Result<(), StoreError>;

    /// Commits every staged write atomically.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the commit fails; nothing persists.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// State a payment settlement decision is made against
#[derive(Clone, Debug)]
pub struct PaymentSnapshot {
    /// The payment being settled
    pub payment: PendingPayment,
    /// The event it belongs to
    pub event: Event,
    /// The covered participants, primary first
    pub participants: Vec<Participant>,
    /// Registered participants across all brackets
    pub registered_count: u32,
    /// Gender tally of the party's bracket
    pub bracket: crate::admission::BracketTally,
}

/// Atomic write sequence settling one payment.
///
/// Holds the event admission lock like [`RegistrationUow`], so the late
/// capacity/ratio re-check and the status flips are serialized against
/// concurrent registrations.
#[async_trait]
pub trait PaymentUow: Send {
    /// The settlement snapshot read under the event lock
    fn snapshot(&self) -> &PaymentSnapshot;

    /// Stages the payment's transition to `paid`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn mark_paid(&mut self) -> Result<(), StoreError>;

    /// Stages a status change for every covered participant.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn set_party_status(&mut self, status: ParticipantStatus) -> Result<(), StoreError>;

    /// Stages removal of the party's waitlist entries, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn remove_party_waitlist_entries(&mut self) -> Result<(), StoreError>;

    /// Stages an idempotent waitlist entry for the party (late re-check
    /// routed the party back to the waitlist).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn ensure_waitlist_entry(&mut self) -> Result<(), StoreError>;

    /// Commits every staged write atomically.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the commit fails; nothing persists.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Persistence seam of the admission engine
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    /// Persists a new event.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn insert_event(&self, event: &Event) -> Result<(), StoreError>;

    /// Loads an event by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn event(&self, id: EventId) -> Result<Option<Event>, StoreError>;

    /// Lists published, non-cancelled events on or after `from`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn list_open_events(&self, from: NaiveDate) -> Result<Vec<Event>, StoreError>;

    /// Counts `Registered` participants for an event across all brackets.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn registered_count(&self, event_id: EventId) -> Result<u32, StoreError>;

    /// Loads a person by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn person(&self, id: PersonId) -> Result<Option<Person>, StoreError>;

    /// Loads a participant by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError>;

    /// Opens a registration unit of work, locking admission decisions for
    /// the event and snapshotting the state the decision needs.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the event does not exist, or a
    /// backend error.
    async fn begin_registration(
        &self,
        event_id: EventId,
        person_id: PersonId,
        bracket: AgeBracket,
    ) -> Result<Box<dyn RegistrationUow>, StoreError>;

    /// Opens a payment settlement unit of work, locking admission
    /// decisions for the payment's event.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the payment does not exist, or a
    /// backend error.
    async fn begin_payment(&self, payment_id: PaymentId) -> Result<Box<dyn PaymentUow>, StoreError>;

    /// Loads a pending payment by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn payment(&self, id: PaymentId) -> Result<Option<PendingPayment>, StoreError>;

    /// Finds the person's paid registration payment for an event.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn find_paid_payment(
        &self,
        person_id: PersonId,
        event_id: EventId,
    ) -> Result<Option<PendingPayment>, StoreError>;

    /// Finds an unpaid payment for the same payer, event, amount and
    /// party composition, for reuse during waitlist promotion.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn find_reusable_unpaid_payment(
        &self,
        entry: &WaitlistEntry,
        amount: Money,
    ) -> Result<Option<PendingPayment>, StoreError>;

    /// Creates a pending payment outside a registration unit of work
    /// (waitlist promotion).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn create_payment(&self, payment: NewPayment) -> Result<PaymentId, StoreError>;

    /// Finds the person's `Registered` participant row for an event.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn find_registered_participant(
        &self,
        person_id: PersonId,
        event_id: EventId,
    ) -> Result<Option<Participant>, StoreError>;

    /// Transitions a participant to `Canceled`, stamping the time.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn cancel_participant(
        &self,
        id: ParticipantId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Idempotently enqueues a waitlist entry outside a unit of work.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn insert_waitlist_entry(&self, entry: NewWaitlistEntry) -> Result<(), StoreError>;

    /// Loads the waitlist for an event and bracket, oldest entry first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn waitlist_entries(
        &self,
        event_id: EventId,
        bracket: AgeBracket,
    ) -> Result<Vec<WaitlistEntry>, StoreError>;

    /// Records an issued voucher.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn record_voucher(&self, voucher: &crate::types::Voucher) -> Result<(), StoreError>;

    /// Atomically claims the event's one-shot capacity warning flag.
    /// Returns `true` exactly once per event.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn claim_capacity_warning(&self, event_id: EventId) -> Result<bool, StoreError>;

    /// Lists the operational administrators who receive capacity
    /// warnings.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on backend failure.
    async fn operators(&self) -> Result<Vec<Person>, StoreError>;
}
