//! Domain types for the MeetLocal admissions platform.
//!
//! This module contains the value objects, entities and request payloads the
//! admission engine operates on: events with per-venue seat allocations,
//! participants and their lifecycle, pending payments, waitlist entries and
//! goodwill vouchers.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a person (a user account holder or an invited guest)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonId(Uuid);

impl PersonId {
    /// Creates a new random `PersonId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PersonId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PersonId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a participant row (one person registered to one event)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    /// Creates a new random `ParticipantId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ParticipantId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a pending payment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Creates a new random `PaymentId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PaymentId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a waitlist entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaitlistEntryId(Uuid);

impl WaitlistEntryId {
    /// Creates a new random `WaitlistEntryId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `WaitlistEntryId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WaitlistEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WaitlistEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents an amount of money in euro cents to avoid floating-point
/// arithmetic errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// A zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole euros
    ///
    /// # Panics
    ///
    /// Panics if the conversion would overflow (euros * 100 > `u64::MAX`).
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_euros(euros: u64) -> Self {
        match euros.checked_mul(100) {
            Some(cents) => Self(cents),
            None => panic!("Money::from_euros overflow"),
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Subtracts `other`, saturating at zero
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Multiplies the amount by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Splits the amount into `parts` equal per-person shares, rounding to
    /// the nearest cent. A `parts` of zero is treated as one.
    #[must_use]
    pub const fn per_person_share(self, parts: u32) -> Self {
        let parts = if parts == 0 { 1 } else { parts as u64 };
        Self((self.0 + parts / 2) / parts)
    }

    /// Renders the amount as a plain decimal euro string, e.g. `"20.00"`
    #[must_use]
    pub fn to_euro_string(&self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "€{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Gender of a participant.
///
/// Only `Male` and `Female` enter the gender-ratio denominator; `Diverse`
/// and `Unset` participants are admitted without affecting the ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Non-binary / other
    Diverse,
    /// Not provided
    Unset,
}

impl Gender {
    /// Stable string form used for persistence
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Diverse => "diverse",
            Self::Unset => "unset",
        }
    }
}

impl FromStr for Gender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "diverse" => Ok(Self::Diverse),
            "unset" => Ok(Self::Unset),
            other => Err(ParseEnumError::new("gender", other)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Age bracket an event registration belongs to.
///
/// Brackets segment each event into independent pools for the ratio policy.
/// Bounds are inclusive; the top bracket has no upper bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeBracket {
    /// Ages 20 through 30
    #[serde(rename = "20–30")]
    Twenties,
    /// Ages 31 through 40
    #[serde(rename = "31–40")]
    Thirties,
    /// Ages 41 through 50
    #[serde(rename = "41–50")]
    Forties,
    /// Ages 50 and up
    #[serde(rename = "50+")]
    FiftyPlus,
}

impl AgeBracket {
    /// All brackets, youngest first
    pub const ALL: [Self; 4] = [Self::Twenties, Self::Thirties, Self::Forties, Self::FiftyPlus];

    /// Inclusive lower and (optional) upper age bound
    #[must_use]
    pub const fn bounds(&self) -> (i32, Option<i32>) {
        match self {
            Self::Twenties => (20, Some(30)),
            Self::Thirties => (31, Some(40)),
            Self::Forties => (41, Some(50)),
            Self::FiftyPlus => (50, None),
        }
    }

    /// Whether the given age falls inside this bracket
    #[must_use]
    pub const fn contains(&self, age: i32) -> bool {
        let (lower, upper) = self.bounds();
        if age < lower {
            return false;
        }
        match upper {
            Some(upper) => age <= upper,
            None => true,
        }
    }

    /// Human-facing label, also the stable persisted form
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Twenties => "20–30",
            Self::Thirties => "31–40",
            Self::Forties => "41–50",
            Self::FiftyPlus => "50+",
        }
    }
}

impl FromStr for AgeBracket {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "20–30" => Ok(Self::Twenties),
            "31–40" => Ok(Self::Thirties),
            "41–50" => Ok(Self::Forties),
            "50+" => Ok(Self::FiftyPlus),
            other => Err(ParseEnumError::new("age bracket", other)),
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a participant.
///
/// Waitlisted registrations carry an explicit status in addition to their
/// queue entry, so a participant's true state is readable without a join.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Admitted; seat is held pending payment completion
    AwaitingPayment,
    /// Deferred to the bracket's waitlist
    Waitlisted,
    /// Payment confirmed; seat counts against event capacity
    Registered,
    /// Registration was cancelled
    Canceled,
}

impl ParticipantStatus {
    /// Stable string form used for persistence
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingPayment => "awaiting_payment",
            Self::Waitlisted => "waitlisted",
            Self::Registered => "registered",
            Self::Canceled => "canceled",
        }
    }

    /// Whether this status blocks a new registration for the same
    /// person, event and bracket
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::AwaitingPayment | Self::Waitlisted | Self::Registered)
    }
}

impl FromStr for ParticipantStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "waitlisted" => Ok(Self::Waitlisted),
            "registered" => Ok(Self::Registered),
            "canceled" => Ok(Self::Canceled),
            other => Err(ParseEnumError::new("participant status", other)),
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a pending payment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting the payment collaborator's confirmation
    Unpaid,
    /// Confirmed by the payment collaborator
    Paid,
}

impl PaymentStatus {
    /// Stable string form used for persistence
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            other => Err(ParseEnumError::new("payment status", other)),
        }
    }
}

/// Error returned when parsing a persisted enum string fails
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

// ============================================================================
// Entities
// ============================================================================

/// Seat allocation at one partner venue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueAllocation {
    /// Venue name
    pub venue: String,
    /// Seats available at this venue
    pub seats: u32,
}

/// A published social event.
///
/// Immutable after publication except for the cancellation flag and the
/// one-shot capacity warning flag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Short marketing tagline
    pub tagline: String,
    /// City the event takes place in
    pub city: String,
    /// Calendar date in the venue time zone
    pub date: NaiveDate,
    /// Local start time, `"HH:MM"`
    pub start_time: String,
    /// Local end time, `"HH:MM"`
    pub end_time: String,
    /// Per-venue seat allocations
    pub venues: Vec<VenueAllocation>,
    /// Draft events are not open for registration
    pub is_draft: bool,
    /// Cancelled events are not open for registration
    pub is_canceled: bool,
    /// Set once the 90%-capacity warning has been dispatched
    pub capacity_warning_sent: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Total seat capacity: the sum of all venue allocations
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.venues.iter().map(|v| v.seats).sum()
    }

    /// Whether the event accepts registrations at all
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.is_draft && !self.is_canceled
    }

    /// The event's start instant, resolved in the venue time zone.
    ///
    /// The stored start time is `"HH:MM"`, but ranges like
    /// `"19:00 - 23:00"` are tolerated by reading the leading time. An
    /// unparseable time falls back to midnight, matching the lenient
    /// handling of legacy event rows.
    #[must_use]
    pub fn start_instant(&self, tz: Tz) -> Option<DateTime<Utc>> {
        let time = parse_local_time(&self.start_time).unwrap_or(NaiveTime::MIN);
        let local = self.date.and_time(time);
        tz.from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Reads the leading `HH:MM` out of a local time string
fn parse_local_time(s: &str) -> Option<NaiveTime> {
    let lead: &str = s.trim().split(|c: char| c != ':' && !c.is_ascii_digit()).next()?;
    let (hour, minute) = lead.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// A person known to the platform: an account holder or an invited guest
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Person {
    /// Person identifier
    pub id: PersonId,
    /// Unique email address
    pub email: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Preferred notification locale
    pub locale: String,
    /// Operational administrators receive capacity warnings
    pub is_operator: bool,
    /// Matching preference answers, updated at each registration
    pub preferences: PreferenceProfile,
}

impl Person {
    /// Full display name
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Free-form matching preference answers carried through to the
/// post-event matching phase. All fields are optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    /// What the person is looking for in a relationship
    pub relationship_goal: Option<String>,
    /// Self-description of personality
    pub kind_of_person: Option<String>,
    /// Comfort level around new people
    pub feel_around_new_people: Option<String>,
    /// Preferred way of spending time
    pub prefer_spending_time: Option<String>,
    /// Free-text self description
    pub describe_you_better: Option<String>,
    /// Self-described role in a relationship
    pub describe_role_in_relationship: Option<String>,
    /// Who the person hopes to meet
    pub looking_for: Option<String>,
}

/// One person's registration to one event.
///
/// Participants are never deleted; cancellations flip the status and stamp
/// `canceled_at`, preserving the audit trail.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Participant {
    /// Participant identifier
    pub id: ParticipantId,
    /// Event registered for
    pub event_id: EventId,
    /// The person behind this registration
    pub person_id: PersonId,
    /// First name as entered at registration
    pub first_name: String,
    /// Last name as entered at registration
    pub last_name: String,
    /// Contact email as entered at registration
    pub email: String,
    /// Gender used by the ratio policy
    pub gender: Gender,
    /// Birth date used by the bracket policy
    pub birth_date: NaiveDate,
    /// Age bracket registered into
    pub bracket: AgeBracket,
    /// Primary registrant (true) or invited companion (false)
    pub is_primary: bool,
    /// Lifecycle status
    pub status: ParticipantStatus,
    /// When the registration was cancelled, if it was
    pub canceled_at: Option<DateTime<Utc>>,
    /// Whether the person has children
    pub has_children: bool,
    /// Matching preference answers snapshot
    pub preferences: PreferenceProfile,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A payment obligation covering one registration unit (the primary
/// registrant and, if invited, their companion)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingPayment {
    /// Payment identifier
    pub id: PaymentId,
    /// Event the payment is for
    pub event_id: EventId,
    /// Person who owes the amount (the primary registrant)
    pub payer_id: PersonId,
    /// The primary registrant's participant row
    pub participant_id: ParticipantId,
    /// Companion participant rows covered by this payment
    pub companion_participant_ids: Vec<ParticipantId>,
    /// Amount owed: base fee times the number of covered participants
    pub amount: Money,
    /// Payment status
    pub status: PaymentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl PendingPayment {
    /// Number of participants this payment covers
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // a party is at most a handful of people
    pub fn covered_participants(&self) -> u32 {
        1 + self.companion_participant_ids.len() as u32
    }

    /// All participant rows covered, primary first
    #[must_use]
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        let mut ids = Vec::with_capacity(self.companion_participant_ids.len() + 1);
        ids.push(self.participant_id);
        ids.extend(self.companion_participant_ids.iter().copied());
        ids
    }
}

/// A deferred registration waiting for a slot in its event and bracket
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaitlistEntry {
    /// Entry identifier
    pub id: WaitlistEntryId,
    /// Event waited on
    pub event_id: EventId,
    /// Bracket waited on
    pub bracket: AgeBracket,
    /// The waiting person
    pub person_id: PersonId,
    /// The waiting person's participant row
    pub participant_id: ParticipantId,
    /// Invited companion's person, if the party has one
    pub companion_person_id: Option<PersonId>,
    /// Invited companion's participant row, if the party has one
    pub companion_participant_id: Option<ParticipantId>,
    /// Queue position is creation order, oldest first
    pub created_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Number of people in the waiting party
    #[must_use]
    pub const fn party_size(&self) -> u32 {
        if self.companion_participant_id.is_some() { 2 } else { 1 }
    }
}

/// A single-use, amount-based discount credit issued for a timely
/// cancellation. Redemption is owned by the payment collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Voucher {
    /// Redemption code, e.g. `MEET-9F3K2B7A`
    pub code: String,
    /// Person the voucher belongs to
    pub person_id: PersonId,
    /// Event the cancellation originated from
    pub event_id: EventId,
    /// Credit amount: the per-person share originally paid
    pub amount: Money,
    /// ISO currency code, lowercase
    pub currency: String,
    /// Expiry instant (24 months after issuance)
    pub expires_at: DateTime<Utc>,
    /// Whether the collaborator reported the voucher as redeemed
    pub redeemed: bool,
}

// ============================================================================
// Registration requests
// ============================================================================

/// Details of one member of a registering party
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PartyMember {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Contact email
    pub email: String,
    /// Gender (ratio policy input)
    pub gender: Gender,
    /// Birth date (bracket policy input)
    pub birth_date: NaiveDate,
    /// Whether the member has children
    pub has_children: bool,
    /// Matching preference answers
    pub preferences: PreferenceProfile,
}

/// A registration request: a primary registrant and at most one invited
/// companion, admitted or deferred as a single unit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Event to register for
    pub event_id: EventId,
    /// The primary registrant's person id
    pub person_id: PersonId,
    /// Requested age bracket
    pub bracket: AgeBracket,
    /// The primary registrant's details
    pub primary: PartyMember,
    /// Invited companion, if any
    pub companion: Option<PartyMember>,
}

impl RegistrationRequest {
    /// Number of people in the party (1 or 2)
    #[must_use]
    pub const fn party_size(&self) -> u32 {
        if self.companion.is_some() { 2 } else { 1 }
    }
}

/// Outcome of a successful registration request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// Admitted; the party holds seats until the payment completes
    PaymentRequired {
        /// Payment to complete
        payment_id: PaymentId,
        /// Amount owed
        amount: Money,
    },
    /// Deferred to the bracket's waitlist
    Waitlisted,
}

/// Computes a person's age in whole years at `today`.
///
/// Calendar-year difference, minus one if the birthday has not yet
/// occurred this year.
#[must_use]
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_counts_birthday_not_yet_reached() {
        let birth = date(1995, 6, 15);
        assert_eq!(age_on(birth, date(2025, 6, 14)), 29);
        assert_eq!(age_on(birth, date(2025, 6, 15)), 30);
        assert_eq!(age_on(birth, date(2025, 6, 16)), 30);
    }

    #[test]
    fn bracket_bounds_are_inclusive() {
        assert!(AgeBracket::Twenties.contains(20));
        assert!(AgeBracket::Twenties.contains(30));
        assert!(!AgeBracket::Twenties.contains(31));
        assert!(AgeBracket::FiftyPlus.contains(50));
        assert!(AgeBracket::FiftyPlus.contains(93));
        assert!(!AgeBracket::FiftyPlus.contains(49));
    }

    #[test]
    fn bracket_labels_round_trip() {
        for bracket in AgeBracket::ALL {
            assert_eq!(bracket.label().parse::<AgeBracket>().unwrap(), bracket);
        }
    }

    #[test]
    fn money_per_person_share_rounds() {
        assert_eq!(Money::from_euros(40).per_person_share(2), Money::from_euros(20));
        assert_eq!(Money::from_cents(2001).per_person_share(2), Money::from_cents(1001));
        assert_eq!(Money::from_euros(20).per_person_share(0), Money::from_euros(20));
    }

    #[test]
    fn money_formats_as_euros() {
        assert_eq!(Money::from_cents(2050).to_string(), "€20.50");
        assert_eq!(Money::from_euros(40).to_euro_string(), "40.00");
    }

    #[test]
    fn event_capacity_sums_venue_allocations() {
        let event = Event {
            id: EventId::new(),
            tagline: "Dinner night".to_string(),
            city: "Berlin".to_string(),
            date: date(2025, 9, 20),
            start_time: "19:00".to_string(),
            end_time: "23:00".to_string(),
            venues: vec![
                VenueAllocation { venue: "Bar A".to_string(), seats: 12 },
                VenueAllocation { venue: "Bar B".to_string(), seats: 8 },
            ],
            is_draft: false,
            is_canceled: false,
            capacity_warning_sent: false,
            created_at: Utc::now(),
        };
        assert_eq!(event.capacity(), 20);
        assert!(event.is_open());
    }

    #[test]
    fn start_instant_resolves_in_venue_time_zone() {
        let event = Event {
            id: EventId::new(),
            tagline: "Dinner night".to_string(),
            city: "Berlin".to_string(),
            date: date(2025, 1, 15),
            start_time: "19:00".to_string(),
            end_time: "23:00".to_string(),
            venues: vec![VenueAllocation { venue: "Bar A".to_string(), seats: 10 }],
            is_draft: false,
            is_canceled: false,
            capacity_warning_sent: false,
            created_at: Utc::now(),
        };
        // Berlin is UTC+1 in January
        let start = event.start_instant(chrono_tz::Europe::Berlin).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-01-15T18:00:00+00:00");
    }

    #[test]
    fn start_instant_tolerates_time_ranges() {
        assert_eq!(parse_local_time("18:30 - 23:00").unwrap(), NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(parse_local_time("7:05").unwrap(), NaiveTime::from_hms_opt(7, 5, 0).unwrap());
        assert!(parse_local_time("soon").is_none());
    }
}
