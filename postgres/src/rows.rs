//! Row types bridging the relational schema and the domain model.
//!
//! Enum-ish columns (gender, bracket, statuses) are stored as their stable
//! string forms; parsing them back surfaces schema drift as a storage
//! error instead of a panic.

use chrono::{DateTime, NaiveDate, Utc};
use meetlocal_core::error::StoreError;
use meetlocal_core::types::{
    Event, EventId, Participant, ParticipantId, PaymentId, PendingPayment, Person, PersonId,
    PreferenceProfile, VenueAllocation, WaitlistEntry, WaitlistEntryId,
};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub tagline: String,
    pub city: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub is_draft: bool,
    pub is_canceled: bool,
    pub capacity_warning_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl EventRow {
    pub(crate) fn into_event(self, venues: Vec<VenueAllocation>) -> Event {
        Event {
            id: EventId::from_uuid(self.id),
            tagline: self.tagline,
            city: self.city,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            venues,
            is_draft: self.is_draft,
            is_canceled: self.is_canceled,
            capacity_warning_sent: self.capacity_warning_sent,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PersonRow {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub locale: String,
    pub is_operator: bool,
    pub preferences: Json<PreferenceProfile>,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Self {
            id: PersonId::from_uuid(row.id),
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            locale: row.locale,
            is_operator: row.is_operator,
            preferences: row.preferences.0,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ParticipantRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub person_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub birth_date: NaiveDate,
    pub bracket: String,
    pub is_primary: bool,
    pub status: String,
    pub canceled_at: Option<DateTime<Utc>>,
    pub has_children: bool,
    pub preferences: Json<PreferenceProfile>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ParticipantRow> for Participant {
    type Error = StoreError;

    fn try_from(row: ParticipantRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ParticipantId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            person_id: PersonId::from_uuid(row.person_id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            gender: row.gender.parse().map_err(StoreError::backend)?,
            birth_date: row.birth_date,
            bracket: row.bracket.parse().map_err(StoreError::backend)?,
            is_primary: row.is_primary,
            status: row.status.parse().map_err(StoreError::backend)?,
            canceled_at: row.canceled_at,
            has_children: row.has_children,
            preferences: row.preferences.0,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub payer_id: Uuid,
    pub participant_id: Uuid,
    pub companion_participant_ids: Vec<Uuid>,
    pub amount_cents: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PendingPayment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PaymentId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            payer_id: PersonId::from_uuid(row.payer_id),
            participant_id: ParticipantId::from_uuid(row.participant_id),
            companion_participant_ids: row
                .companion_participant_ids
                .into_iter()
                .map(ParticipantId::from_uuid)
                .collect(),
            amount: meetlocal_core::types::Money::from_cents(
                u64::try_from(row.amount_cents).map_err(StoreError::backend)?,
            ),
            status: row.status.parse().map_err(StoreError::backend)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct WaitlistRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub bracket: String,
    pub person_id: Uuid,
    pub participant_id: Uuid,
    pub companion_person_id: Option<Uuid>,
    pub companion_participant_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<WaitlistRow> for WaitlistEntry {
    type Error = StoreError;

    fn try_from(row: WaitlistRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: WaitlistEntryId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            bracket: row.bracket.parse().map_err(StoreError::backend)?,
            person_id: PersonId::from_uuid(row.person_id),
            participant_id: ParticipantId::from_uuid(row.participant_id),
            companion_person_id: row.companion_person_id.map(PersonId::from_uuid),
            companion_participant_id: row.companion_participant_id.map(ParticipantId::from_uuid),
            created_at: row.created_at,
        })
    }
}
