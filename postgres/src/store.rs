//! sqlx implementation of the admission storage traits.

use crate::rows::{EventRow, ParticipantRow, PaymentRow, PersonRow, WaitlistRow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use meetlocal_core::admission::{AdmissionSnapshot, BracketTally};
use meetlocal_core::error::StoreError;
use meetlocal_core::store::{
    AdmissionStore, NewParticipant, NewPayment, NewPerson, NewWaitlistEntry, PaymentSnapshot,
    PaymentUow, RegistrationUow,
};
use meetlocal_core::types::{
    AgeBracket, Event, EventId, Money, Participant, ParticipantId, ParticipantStatus, PaymentId,
    PendingPayment, Person, PersonId, PreferenceProfile, VenueAllocation, Voucher, WaitlistEntry,
};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// `PostgreSQL`-backed [`AdmissionStore`]
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates the store on an already-connected pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying connection pool.
    ///
    /// Useful for health checks or manual queries.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn cents(amount: Money) -> Result<i64, StoreError> {
    i64::try_from(amount.cents()).map_err(StoreError::backend)
}

async fn fetch_venues(
    conn: &mut PgConnection,
    event_id: EventId,
) -> Result<Vec<VenueAllocation>, StoreError> {
    let rows: Vec<(String, i32)> =
        sqlx::query_as("SELECT venue, seats FROM venue_allocations WHERE event_id = $1 ORDER BY venue")
            .bind(event_id.as_uuid())
            .fetch_all(&mut *conn)
            .await
            .map_err(StoreError::backend)?;
    Ok(rows
        .into_iter()
        .map(|(venue, seats)| VenueAllocation { venue, seats: u32::try_from(seats).unwrap_or(0) })
        .collect())
}

async fn fetch_event(
    conn: &mut PgConnection,
    event_id: EventId,
) -> Result<Option<Event>, StoreError> {
    let row = sqlx::query_as::<_, EventRow>(
        "SELECT id, tagline, city, date, start_time, end_time,
                is_draft, is_canceled, capacity_warning_sent, created_at
         FROM events WHERE id = $1",
    )
    .bind(event_id.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(StoreError::backend)?;

    match row {
        None => Ok(None),
        Some(row) => {
            let venues = fetch_venues(conn, event_id).await?;
            Ok(Some(row.into_event(venues)))
        }
    }
}

async fn count_registered(conn: &mut PgConnection, event_id: EventId) -> Result<u32, StoreError> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM participants WHERE event_id = $1 AND status = 'registered'",
    )
    .bind(event_id.as_uuid())
    .fetch_one(&mut *conn)
    .await
    .map_err(StoreError::backend)?;
    u32::try_from(count).map_err(StoreError::backend)
}

async fn load_bracket_tally(
    conn: &mut PgConnection,
    event_id: EventId,
    bracket: AgeBracket,
) -> Result<BracketTally, StoreError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT gender, COUNT(*) FROM participants
         WHERE event_id = $1 AND bracket = $2 AND status = 'registered'
         GROUP BY gender",
    )
    .bind(event_id.as_uuid())
    .bind(bracket.label())
    .fetch_all(&mut *conn)
    .await
    .map_err(StoreError::backend)?;

    let mut tally = BracketTally::default();
    for (gender, count) in rows {
        let count = u32::try_from(count).map_err(StoreError::backend)?;
        match gender.as_str() {
            "male" => tally.male += count,
            "female" => tally.female += count,
            _ => {}
        }
        tally.total += count;
    }
    Ok(tally)
}

async fn fetch_participant(
    conn: &mut PgConnection,
    id: ParticipantId,
) -> Result<Option<Participant>, StoreError> {
    let row = sqlx::query_as::<_, ParticipantRow>(
        "SELECT id, event_id, person_id, first_name, last_name, email, gender, birth_date,
                bracket, is_primary, status, canceled_at, has_children, preferences, created_at
         FROM participants WHERE id = $1",
    )
    .bind(id.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(StoreError::backend)?;
    row.map(Participant::try_from).transpose()
}

async fn fetch_payment(
    conn: &mut PgConnection,
    id: PaymentId,
) -> Result<Option<PendingPayment>, StoreError> {
    let row = sqlx::query_as::<_, PaymentRow>(
        "SELECT id, event_id, payer_id, participant_id, companion_participant_ids,
                amount_cents, status, created_at
         FROM payments WHERE id = $1",
    )
    .bind(id.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(StoreError::backend)?;
    row.map(PendingPayment::try_from).transpose()
}

/// Takes the per-event admission lock. Returns `false` if the event does
/// not exist.
async fn lock_event(conn: &mut PgConnection, event_id: EventId) -> Result<bool, StoreError> {
    let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM events WHERE id = $1 FOR UPDATE")
        .bind(event_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(StoreError::backend)?;
    Ok(locked.is_some())
}

async fn stage_participant(
    conn: &mut PgConnection,
    participant: NewParticipant,
) -> Result<ParticipantId, StoreError> {
    let id = ParticipantId::new();
    sqlx::query(
        "INSERT INTO participants
            (id, event_id, person_id, first_name, last_name, email, gender, birth_date,
             bracket, is_primary, status, has_children, preferences)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(id.as_uuid())
    .bind(participant.event_id.as_uuid())
    .bind(participant.person_id.as_uuid())
    .bind(&participant.first_name)
    .bind(&participant.last_name)
    .bind(&participant.email)
    .bind(participant.gender.as_str())
    .bind(participant.birth_date)
    .bind(participant.bracket.label())
    .bind(participant.is_primary)
    .bind(participant.status.as_str())
    .bind(participant.has_children)
    .bind(Json(&participant.preferences))
    .execute(&mut *conn)
    .await
    .map_err(StoreError::backend)?;
    Ok(id)
}

async fn stage_payment(
    conn: &mut PgConnection,
    payment: NewPayment,
) -> Result<PaymentId, StoreError> {
    let id = PaymentId::new();
    let companions: Vec<Uuid> =
        payment.companion_participant_ids.iter().map(|p| *p.as_uuid()).collect();
    sqlx::query(
        "INSERT INTO payments
            (id, event_id, payer_id, participant_id, companion_participant_ids, amount_cents, status)
         VALUES ($1, $2, $3, $4, $5, $6, 'unpaid')",
    )
    .bind(id.as_uuid())
    .bind(payment.event_id.as_uuid())
    .bind(payment.payer_id.as_uuid())
    .bind(payment.participant_id.as_uuid())
    .bind(companions)
    .bind(cents(payment.amount)?)
    .execute(&mut *conn)
    .await
    .map_err(StoreError::backend)?;
    Ok(id)
}

async fn stage_waitlist_entry(
    conn: &mut PgConnection,
    entry: NewWaitlistEntry,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO waitlist_entries
            (id, event_id, bracket, person_id, participant_id,
             companion_person_id, companion_participant_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (event_id, person_id, bracket) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(entry.event_id.as_uuid())
    .bind(entry.bracket.label())
    .bind(entry.person_id.as_uuid())
    .bind(entry.participant_id.as_uuid())
    .bind(entry.companion_person_id.map(|p| *p.as_uuid()))
    .bind(entry.companion_participant_id.map(|p| *p.as_uuid()))
    .execute(&mut *conn)
    .await
    .map_err(StoreError::backend)?;
    Ok(())
}

#[async_trait]
impl AdmissionStore for PostgresStore {
    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        sqlx::query(
            "INSERT INTO events
                (id, tagline, city, date, start_time, end_time,
                 is_draft, is_canceled, capacity_warning_sent, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(event.id.as_uuid())
        .bind(&event.tagline)
        .bind(&event.city)
        .bind(event.date)
        .bind(&event.start_time)
        .bind(&event.end_time)
        .bind(event.is_draft)
        .bind(event.is_canceled)
        .bind(event.capacity_warning_sent)
        .bind(event.created_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::backend)?;

        for venue in &event.venues {
            sqlx::query("INSERT INTO venue_allocations (event_id, venue, seats) VALUES ($1, $2, $3)")
                .bind(event.id.as_uuid())
                .bind(&venue.venue)
                .bind(i32::try_from(venue.seats).map_err(StoreError::backend)?)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::backend)?;
        }
        tx.commit().await.map_err(StoreError::backend)
    }

    async fn event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        fetch_event(&mut conn, id).await
    }

    async fn list_open_events(&self, from: NaiveDate) -> Result<Vec<Event>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT id, tagline, city, date, start_time, end_time,
                    is_draft, is_canceled, capacity_warning_sent, created_at
             FROM events
             WHERE is_draft = FALSE AND is_canceled = FALSE AND date >= $1
             ORDER BY date",
        )
        .bind(from)
        .fetch_all(&mut *conn)
        .await
        .map_err(StoreError::backend)?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_id = EventId::from_uuid(row.id);
            let venues = fetch_venues(&mut conn, event_id).await?;
            events.push(row.into_event(venues));
        }
        Ok(events)
    }

    async fn registered_count(&self, event_id: EventId) -> Result<u32, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        count_registered(&mut conn, event_id).await
    }

    async fn person(&self, id: PersonId) -> Result<Option<Person>, StoreError> {
        let row = sqlx::query_as::<_, PersonRow>(
            "SELECT id, email, first_name, last_name, locale, is_operator, preferences
             FROM persons WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(row.map(Person::from))
    }

    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        fetch_participant(&mut conn, id).await
    }

    async fn begin_registration(
        &self,
        event_id: EventId,
        person_id: PersonId,
        bracket: AgeBracket,
    ) -> Result<Box<dyn RegistrationUow>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        if !lock_event(&mut tx, event_id).await? {
            return Err(StoreError::NotFound { entity: "event" });
        }
        let event =
            fetch_event(&mut tx, event_id).await?.ok_or(StoreError::NotFound { entity: "event" })?;

        let registered_count = count_registered(&mut tx, event_id).await?;
        let tally = load_bracket_tally(&mut tx, event_id, bracket).await?;
        let (duplicate,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                 SELECT 1 FROM participants
                 WHERE person_id = $1 AND event_id = $2 AND bracket = $3
                   AND status IN ('awaiting_payment', 'waitlisted', 'registered')
             )",
        )
        .bind(person_id.as_uuid())
        .bind(event_id.as_uuid())
        .bind(bracket.label())
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::backend)?;

        Ok(Box::new(PostgresRegistrationUow {
            tx,
            snapshot: AdmissionSnapshot { event, registered_count, bracket: tally, duplicate },
        }))
    }

    async fn begin_payment(&self, payment_id: PaymentId) -> Result<Box<dyn PaymentUow>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        let payment = fetch_payment(&mut tx, payment_id)
            .await?
            .ok_or(StoreError::NotFound { entity: "payment" })?;
        if !lock_event(&mut tx, payment.event_id).await? {
            return Err(StoreError::NotFound { entity: "event" });
        }
        let event = fetch_event(&mut tx, payment.event_id)
            .await?
            .ok_or(StoreError::NotFound { entity: "event" })?;

        let mut participants = Vec::new();
        for id in payment.participant_ids() {
            if let Some(participant) = fetch_participant(&mut tx, id).await? {
                participants.push(participant);
            }
        }
        let primary =
            participants.first().ok_or(StoreError::NotFound { entity: "participant" })?;

        let registered_count = count_registered(&mut tx, payment.event_id).await?;
        let tally = load_bracket_tally(&mut tx, payment.event_id, primary.bracket).await?;

        Ok(Box::new(PostgresPaymentUow {
            tx,
            snapshot: PaymentSnapshot {
                registered_count,
                bracket: tally,
                event,
                participants,
                payment,
            },
        }))
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<PendingPayment>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        fetch_payment(&mut conn, id).await
    }

    async fn find_paid_payment(
        &self,
        person_id: PersonId,
        event_id: EventId,
    ) -> Result<Option<PendingPayment>, StoreError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, event_id, payer_id, participant_id, companion_participant_ids,
                    amount_cents, status, created_at
             FROM payments
             WHERE payer_id = $1 AND event_id = $2 AND status = 'paid'
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(person_id.as_uuid())
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        row.map(PendingPayment::try_from).transpose()
    }

    async fn find_reusable_unpaid_payment(
        &self,
        entry: &WaitlistEntry,
        amount: Money,
    ) -> Result<Option<PendingPayment>, StoreError> {
        let companions: Vec<Uuid> =
            entry.companion_participant_id.iter().map(|p| *p.as_uuid()).collect();
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, event_id, payer_id, participant_id, companion_participant_ids,
                    amount_cents, status, created_at
             FROM payments
             WHERE payer_id = $1 AND event_id = $2 AND status = 'unpaid'
               AND amount_cents = $3 AND companion_participant_ids = $4
             ORDER BY created_at
             LIMIT 1",
        )
        .bind(entry.person_id.as_uuid())
        .bind(entry.event_id.as_uuid())
        .bind(cents(amount)?)
        .bind(companions)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        row.map(PendingPayment::try_from).transpose()
    }

    async fn create_payment(&self, payment: NewPayment) -> Result<PaymentId, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        stage_payment(&mut conn, payment).await
    }

    async fn find_registered_participant(
        &self,
        person_id: PersonId,
        event_id: EventId,
    ) -> Result<Option<Participant>, StoreError> {
        let row = sqlx::query_as::<_, ParticipantRow>(
            "SELECT id, event_id, person_id, first_name, last_name, email, gender, birth_date,
                    bracket, is_primary, status, canceled_at, has_children, preferences, created_at
             FROM participants
             WHERE person_id = $1 AND event_id = $2 AND status = 'registered'
             LIMIT 1",
        )
        .bind(person_id.as_uuid())
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        row.map(Participant::try_from).transpose()
    }

    async fn cancel_participant(
        &self,
        id: ParticipantId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE participants SET status = 'canceled', canceled_at = $2 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "participant" });
        }
        Ok(())
    }

    async fn insert_waitlist_entry(&self, entry: NewWaitlistEntry) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        stage_waitlist_entry(&mut conn, entry).await
    }

    async fn waitlist_entries(
        &self,
        event_id: EventId,
        bracket: AgeBracket,
    ) -> Result<Vec<WaitlistEntry>, StoreError> {
        let rows = sqlx::query_as::<_, WaitlistRow>(
            "SELECT id, event_id, bracket, person_id, participant_id,
                    companion_person_id, companion_participant_id, created_at
             FROM waitlist_entries
             WHERE event_id = $1 AND bracket = $2
             ORDER BY created_at",
        )
        .bind(event_id.as_uuid())
        .bind(bracket.label())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        rows.into_iter().map(WaitlistEntry::try_from).collect()
    }

    async fn record_voucher(&self, voucher: &Voucher) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO vouchers (code, person_id, event_id, amount_cents, currency, expires_at, redeemed)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&voucher.code)
        .bind(voucher.person_id.as_uuid())
        .bind(voucher.event_id.as_uuid())
        .bind(cents(voucher.amount)?)
        .bind(&voucher.currency)
        .bind(voucher.expires_at)
        .bind(voucher.redeemed)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn claim_capacity_warning(&self, event_id: EventId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE events SET capacity_warning_sent = TRUE
             WHERE id = $1 AND capacity_warning_sent = FALSE",
        )
        .bind(event_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(result.rows_affected() == 1)
    }

    async fn operators(&self) -> Result<Vec<Person>, StoreError> {
        let rows = sqlx::query_as::<_, PersonRow>(
            "SELECT id, email, first_name, last_name, locale, is_operator, preferences
             FROM persons WHERE is_operator = TRUE
             ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Person::from).collect())
    }
}

struct PostgresRegistrationUow {
    tx: Transaction<'static, Postgres>,
    snapshot: AdmissionSnapshot,
}

#[async_trait]
impl RegistrationUow for PostgresRegistrationUow {
    fn snapshot(&self) -> &AdmissionSnapshot {
        &self.snapshot
    }

    async fn find_or_create_person(&mut self, person: NewPerson) -> Result<PersonId, StoreError> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM persons WHERE lower(email) = lower($1)")
                .bind(&person.email)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(StoreError::backend)?;
        if let Some((id,)) = existing {
            return Ok(PersonId::from_uuid(id));
        }

        let id = PersonId::new();
        sqlx::query(
            "INSERT INTO persons (id, email, first_name, last_name, locale, is_operator, preferences)
             VALUES ($1, $2, $3, $4, $5, FALSE, '{}'::jsonb)",
        )
        .bind(id.as_uuid())
        .bind(&person.email)
        .bind(&person.first_name)
        .bind(&person.last_name)
        .bind(&person.locale)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::backend)?;
        Ok(id)
    }

    async fn insert_participant(
        &mut self,
        participant: NewParticipant,
    ) -> Result<ParticipantId, StoreError> {
        stage_participant(&mut self.tx, participant).await
    }

    async fn update_person_preferences(
        &mut self,
        person_id: PersonId,
        preferences: &PreferenceProfile,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE persons SET preferences = $2 WHERE id = $1")
            .bind(person_id.as_uuid())
            .bind(Json(preferences))
            .execute(&mut *self.tx)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> Result<PaymentId, StoreError> {
        stage_payment(&mut self.tx, payment).await
    }

    async fn insert_waitlist_entry(&mut self, entry: NewWaitlistEntry) -> Result<(), StoreError> {
        stage_waitlist_entry(&mut self.tx, entry).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(StoreError::backend)
    }
}

struct PostgresPaymentUow {
    tx: Transaction<'static, Postgres>,
    snapshot: PaymentSnapshot,
}

#[async_trait]
impl PaymentUow for PostgresPaymentUow {
    fn snapshot(&self) -> &PaymentSnapshot {
        &self.snapshot
    }

    async fn mark_paid(&mut self) -> Result<(), StoreError> {
        sqlx::query("UPDATE payments SET status = 'paid' WHERE id = $1")
            .bind(self.snapshot.payment.id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn set_party_status(&mut self, status: ParticipantStatus) -> Result<(), StoreError> {
        let ids: Vec<Uuid> =
            self.snapshot.payment.participant_ids().iter().map(|p| *p.as_uuid()).collect();
        sqlx::query("UPDATE participants SET status = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn remove_party_waitlist_entries(&mut self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM waitlist_entries WHERE event_id = $1 AND participant_id = $2")
            .bind(self.snapshot.payment.event_id.as_uuid())
            .bind(self.snapshot.payment.participant_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn ensure_waitlist_entry(&mut self) -> Result<(), StoreError> {
        let primary = self
            .snapshot
            .participants
            .first()
            .ok_or(StoreError::NotFound { entity: "participant" })?;
        let companion = self.snapshot.participants.get(1);
        let entry = NewWaitlistEntry {
            event_id: self.snapshot.payment.event_id,
            bracket: primary.bracket,
            person_id: primary.person_id,
            participant_id: primary.id,
            companion_person_id: companion.map(|c| c.person_id),
            companion_participant_id: companion.map(|c| c.id),
        };
        stage_waitlist_entry(&mut self.tx, entry).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(StoreError::backend)
    }
}
