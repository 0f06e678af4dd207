//! In-memory admission store.
//!
//! Mirrors the production store's concurrency contract: opening a unit of
//! work takes the admission lock, so snapshot reads and the writes that
//! follow are serialized. Writes are staged on a working copy of the
//! state and only become visible at commit; dropping a unit of work
//! without committing discards everything, which is what makes the
//! atomicity tests honest.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use meetlocal_core::admission::{AdmissionSnapshot, BracketTally};
use meetlocal_core::error::StoreError;
use meetlocal_core::store::{
    AdmissionStore, NewParticipant, NewPayment, NewPerson, NewWaitlistEntry, PaymentSnapshot,
    PaymentUow, RegistrationUow,
};
use meetlocal_core::types::{
    AgeBracket, Event, EventId, Participant, ParticipantId, ParticipantStatus, PaymentId,
    PaymentStatus, PendingPayment, Person, PersonId, PreferenceProfile, Voucher, WaitlistEntry,
    WaitlistEntryId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Debug, Default)]
struct MemoryState {
    events: HashMap<EventId, Event>,
    persons: HashMap<PersonId, Person>,
    participants: HashMap<ParticipantId, Participant>,
    payments: HashMap<PaymentId, PendingPayment>,
    waitlist: Vec<WaitlistEntry>,
    vouchers: Vec<Voucher>,
}

impl MemoryState {
    fn registered_count(&self, event_id: EventId) -> u32 {
        u32::try_from(
            self.participants
                .values()
                .filter(|p| p.event_id == event_id && p.status == ParticipantStatus::Registered)
                .count(),
        )
        .unwrap_or(u32::MAX)
    }

    fn bracket_tally(&self, event_id: EventId, bracket: AgeBracket) -> BracketTally {
        let mut tally = BracketTally::default();
        for participant in self.participants.values() {
            if participant.event_id == event_id
                && participant.bracket == bracket
                && participant.status == ParticipantStatus::Registered
            {
                tally.add(participant.gender);
            }
        }
        tally
    }

    fn has_active(&self, person_id: PersonId, event_id: EventId, bracket: AgeBracket) -> bool {
        self.participants.values().any(|p| {
            p.person_id == person_id
                && p.event_id == event_id
                && p.bracket == bracket
                && p.status.is_active()
        })
    }

    fn push_waitlist_entry(&mut self, entry: NewWaitlistEntry) {
        let exists = self.waitlist.iter().any(|e| {
            e.event_id == entry.event_id
                && e.person_id == entry.person_id
                && e.bracket == entry.bracket
        });
        if exists {
            return;
        }
        self.waitlist.push(WaitlistEntry {
            id: WaitlistEntryId::new(),
            event_id: entry.event_id,
            bracket: entry.bracket,
            person_id: entry.person_id,
            participant_id: entry.participant_id,
            companion_person_id: entry.companion_person_id,
            companion_participant_id: entry.companion_participant_id,
            created_at: Utc::now(),
        });
    }
}

/// In-memory [`AdmissionStore`] for unit and concurrency tests
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_payment_inserts: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a person record (account holders come from outside the
    /// engine in production)
    pub async fn seed_person(&self, person: Person) {
        self.state.lock().await.persons.insert(person.id, person);
    }

    /// Arms or disarms the injected failure for pending-payment inserts
    /// inside a registration unit of work
    pub fn fail_payment_inserts(&self, fail: bool) {
        self.fail_payment_inserts.store(fail, Ordering::SeqCst);
    }

    /// All participant rows for an event, for assertions
    pub async fn participants_for_event(&self, event_id: EventId) -> Vec<Participant> {
        let state = self.state.lock().await;
        let mut rows: Vec<Participant> =
            state.participants.values().filter(|p| p.event_id == event_id).cloned().collect();
        rows.sort_by_key(|p| p.created_at);
        rows
    }

    /// All payment rows for an event, for assertions
    pub async fn payments_for_event(&self, event_id: EventId) -> Vec<PendingPayment> {
        let state = self.state.lock().await;
        let mut rows: Vec<PendingPayment> =
            state.payments.values().filter(|p| p.event_id == event_id).cloned().collect();
        rows.sort_by_key(|p| p.created_at);
        rows
    }

    /// All recorded vouchers, for assertions
    pub async fn vouchers(&self) -> Vec<Voucher> {
        self.state.lock().await.vouchers.clone()
    }
}

#[async_trait]
impl AdmissionStore for MemoryStore {
    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        self.state.lock().await.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.state.lock().await.events.get(&id).cloned())
    }

    async fn list_open_events(&self, from: NaiveDate) -> Result<Vec<Event>, StoreError> {
        let state = self.state.lock().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| e.is_open() && e.date >= from)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.date);
        Ok(events)
    }

    async fn registered_count(&self, event_id: EventId) -> Result<u32, StoreError> {
        Ok(self.state.lock().await.registered_count(event_id))
    }

    async fn person(&self, id: PersonId) -> Result<Option<Person>, StoreError> {
        Ok(self.state.lock().await.persons.get(&id).cloned())
    }

    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError> {
        Ok(self.state.lock().await.participants.get(&id).cloned())
    }

    async fn begin_registration(
        &self,
        event_id: EventId,
        person_id: PersonId,
        bracket: AgeBracket,
    ) -> Result<Box<dyn RegistrationUow>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let event = guard
            .events
            .get(&event_id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "event" })?;
        let snapshot = AdmissionSnapshot {
            registered_count: guard.registered_count(event_id),
            bracket: guard.bracket_tally(event_id, bracket),
            duplicate: guard.has_active(person_id, event_id, bracket),
            event,
        };
        let working = (*guard).clone();
        Ok(Box::new(MemoryRegistrationUow {
            guard,
            working,
            snapshot,
            fail_payment_inserts: self.fail_payment_inserts.load(Ordering::SeqCst),
        }))
    }

    async fn begin_payment(&self, payment_id: PaymentId) -> Result<Box<dyn PaymentUow>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let payment = guard
            .payments
            .get(&payment_id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "payment" })?;
        let event = guard
            .events
            .get(&payment.event_id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "event" })?;
        let participants: Vec<Participant> = payment
            .participant_ids()
            .into_iter()
            .filter_map(|id| guard.participants.get(&id).cloned())
            .collect();
        let primary =
            participants.first().ok_or(StoreError::NotFound { entity: "participant" })?;
        let snapshot = PaymentSnapshot {
            registered_count: guard.registered_count(payment.event_id),
            bracket: guard.bracket_tally(payment.event_id, primary.bracket),
            event,
            participants: participants.clone(),
            payment,
        };
        let working = (*guard).clone();
        Ok(Box::new(MemoryPaymentUow { guard, working, snapshot }))
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<PendingPayment>, StoreError> {
        Ok(self.state.lock().await.payments.get(&id).cloned())
    }

    async fn find_paid_payment(
        &self,
        person_id: PersonId,
        event_id: EventId,
    ) -> Result<Option<PendingPayment>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .values()
            .find(|p| {
                p.payer_id == person_id
                    && p.event_id == event_id
                    && p.status == PaymentStatus::Paid
            })
            .cloned())
    }

    async fn find_reusable_unpaid_payment(
        &self,
        entry: &WaitlistEntry,
        amount: meetlocal_core::types::Money,
    ) -> Result<Option<PendingPayment>, StoreError> {
        let expected: Vec<ParticipantId> = entry.companion_participant_id.into_iter().collect();
        let state = self.state.lock().await;
        Ok(state
            .payments
            .values()
            .find(|p| {
                p.payer_id == entry.person_id
                    && p.event_id == entry.event_id
                    && p.status == PaymentStatus::Unpaid
                    && p.amount == amount
                    && p.companion_participant_ids == expected
            })
            .cloned())
    }

    async fn create_payment(&self, payment: NewPayment) -> Result<PaymentId, StoreError> {
        let id = PaymentId::new();
        let mut state = self.state.lock().await;
        state.payments.insert(
            id,
            PendingPayment {
                id,
                event_id: payment.event_id,
                payer_id: payment.payer_id,
                participant_id: payment.participant_id,
                companion_participant_ids: payment.companion_participant_ids,
                amount: payment.amount,
                status: PaymentStatus::Unpaid,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_registered_participant(
        &self,
        person_id: PersonId,
        event_id: EventId,
    ) -> Result<Option<Participant>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .participants
            .values()
            .find(|p| {
                p.person_id == person_id
                    && p.event_id == event_id
                    && p.status == ParticipantStatus::Registered
            })
            .cloned())
    }

    async fn cancel_participant(
        &self,
        id: ParticipantId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let participant =
            state.participants.get_mut(&id).ok_or(StoreError::NotFound { entity: "participant" })?;
        participant.status = ParticipantStatus::Canceled;
        participant.canceled_at = Some(at);
        Ok(())
    }

    async fn insert_waitlist_entry(&self, entry: NewWaitlistEntry) -> Result<(), StoreError> {
        self.state.lock().await.push_waitlist_entry(entry);
        Ok(())
    }

    async fn waitlist_entries(
        &self,
        event_id: EventId,
        bracket: AgeBracket,
    ) -> Result<Vec<WaitlistEntry>, StoreError> {
        let state = self.state.lock().await;
        let mut entries: Vec<WaitlistEntry> = state
            .waitlist
            .iter()
            .filter(|e| e.event_id == event_id && e.bracket == bracket)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    async fn record_voucher(&self, voucher: &Voucher) -> Result<(), StoreError> {
        self.state.lock().await.vouchers.push(voucher.clone());
        Ok(())
    }

    async fn claim_capacity_warning(&self, event_id: EventId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let event =
            state.events.get_mut(&event_id).ok_or(StoreError::NotFound { entity: "event" })?;
        if event.capacity_warning_sent {
            Ok(false)
        } else {
            event.capacity_warning_sent = true;
            Ok(true)
        }
    }

    async fn operators(&self) -> Result<Vec<Person>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.persons.values().filter(|p| p.is_operator).cloned().collect())
    }
}

struct MemoryRegistrationUow {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    snapshot: AdmissionSnapshot,
    fail_payment_inserts: bool,
}

#[async_trait]
impl RegistrationUow for MemoryRegistrationUow {
    fn snapshot(&self) -> &AdmissionSnapshot {
        &self.snapshot
    }

    async fn find_or_create_person(&mut self, person: NewPerson) -> Result<PersonId, StoreError> {
        if let Some(existing) =
            self.working.persons.values().find(|p| p.email.eq_ignore_ascii_case(&person.email))
        {
            return Ok(existing.id);
        }
        let id = PersonId::new();
        self.working.persons.insert(
            id,
            Person {
                id,
                email: person.email,
                first_name: person.first_name,
                last_name: person.last_name,
                locale: person.locale,
                is_operator: false,
                preferences: PreferenceProfile::default(),
            },
        );
        Ok(id)
    }

    async fn insert_participant(
        &mut self,
        participant: NewParticipant,
    ) -> Result<ParticipantId, StoreError> {
        let id = ParticipantId::new();
        self.working.participants.insert(
            id,
            Participant {
                id,
                event_id: participant.event_id,
                person_id: participant.person_id,
                first_name: participant.first_name,
                last_name: participant.last_name,
                email: participant.email,
                gender: participant.gender,
                birth_date: participant.birth_date,
                bracket: participant.bracket,
                is_primary: participant.is_primary,
                status: participant.status,
                canceled_at: None,
                has_children: participant.has_children,
                preferences: participant.preferences,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn update_person_preferences(
        &mut self,
        person_id: PersonId,
        preferences: &PreferenceProfile,
    ) -> Result<(), StoreError> {
        if let Some(person) = self.working.persons.get_mut(&person_id) {
            person.preferences = preferences.clone();
        }
        Ok(())
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> Result<PaymentId, StoreError> {
        if self.fail_payment_inserts {
            return Err(StoreError::Backend("injected payment insert failure".to_string()));
        }
        let id = PaymentId::new();
        self.working.payments.insert(
            id,
            PendingPayment {
                id,
                event_id: payment.event_id,
                payer_id: payment.payer_id,
                participant_id: payment.participant_id,
                companion_participant_ids: payment.companion_participant_ids,
                amount: payment.amount,
                status: PaymentStatus::Unpaid,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn insert_waitlist_entry(&mut self, entry: NewWaitlistEntry) -> Result<(), StoreError> {
        self.working.push_waitlist_entry(entry);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }
}

struct MemoryPaymentUow {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    snapshot: PaymentSnapshot,
}

#[async_trait]
impl PaymentUow for MemoryPaymentUow {
    fn snapshot(&self) -> &PaymentSnapshot {
        &self.snapshot
    }

    async fn mark_paid(&mut self) -> Result<(), StoreError> {
        let payment = self
            .working
            .payments
            .get_mut(&self.snapshot.payment.id)
            .ok_or(StoreError::NotFound { entity: "payment" })?;
        payment.status = PaymentStatus::Paid;
        Ok(())
    }

    async fn set_party_status(&mut self, status: ParticipantStatus) -> Result<(), StoreError> {
        for id in self.snapshot.payment.participant_ids() {
            if let Some(participant) = self.working.participants.get_mut(&id) {
                participant.status = status;
            }
        }
        Ok(())
    }

    async fn remove_party_waitlist_entries(&mut self) -> Result<(), StoreError> {
        let event_id = self.snapshot.payment.event_id;
        let participant_id = self.snapshot.payment.participant_id;
        self.working
            .waitlist
            .retain(|e| !(e.event_id == event_id && e.participant_id == participant_id));
        Ok(())
    }

    async fn ensure_waitlist_entry(&mut self) -> Result<(), StoreError> {
        let primary = self
            .snapshot
            .participants
            .first()
            .ok_or(StoreError::NotFound { entity: "participant" })?;
        let companion = self.snapshot.participants.get(1);
        self.working.push_waitlist_entry(NewWaitlistEntry {
            event_id: self.snapshot.payment.event_id,
            bracket: primary.bracket,
            person_id: primary.person_id,
            participant_id: primary.id,
            companion_person_id: companion.map(|c| c.person_id),
            companion_participant_id: companion.map(|c| c.id),
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }
}
