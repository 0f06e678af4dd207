//! Waitlist queue semantics.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // test code

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{harness_at, policy_with_threshold, settle_background_tasks, Harness};
use meetlocal_core::store::{AdmissionStore, NewWaitlistEntry};
use meetlocal_core::types::{
    AgeBracket, Gender, ParticipantStatus, Person, RegistrationOutcome,
};
use meetlocal_core::CancellationPolicy;
use meetlocal_testing::builders;

fn born_1990() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
}

fn harness() -> Harness {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    harness_at(now, policy_with_threshold(4), CancellationPolicy::default())
}

/// Enqueueing the same person+event+bracket twice yields exactly one
/// entry.
#[tokio::test]
async fn enqueue_is_idempotent() {
    let harness = harness();
    let event = builders::event_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 10);
    harness.store.insert_event(&event).await.unwrap();

    let marc = builders::person("Marc");
    harness.store.seed_person(marc.clone()).await;
    // A waitlisted registration creates the participant rows to point at.
    let participant_id = waitlisted_registration(&harness, &event.id, &marc).await;

    let entry = NewWaitlistEntry {
        event_id: event.id,
        bracket: AgeBracket::Thirties,
        person_id: marc.id,
        participant_id,
        companion_person_id: None,
        companion_participant_id: None,
    };
    harness.waitlist.enqueue(entry.clone()).await.unwrap();
    harness.waitlist.enqueue(entry).await.unwrap();

    let entries =
        harness.store.waitlist_entries(event.id, AgeBracket::Thirties).await.unwrap();
    assert_eq!(entries.len(), 1);
}

/// The promote scan walks entries oldest first, so the earliest deferral
/// is invited first.
#[tokio::test]
async fn promote_scan_preserves_queue_order() {
    let harness = harness();
    let event = builders::event_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 10);
    harness.store.insert_event(&event).await.unwrap();

    // Saturate the male share so further males get deferred in order.
    for (name, gender) in
        [("Milo", Gender::Male), ("Maks", Gender::Male), ("Fay", Gender::Female)]
    {
        let person = builders::person(name);
        harness.store.seed_person(person.clone()).await;
        common::register_and_confirm(
            &harness,
            builders::solo_request(&event, &person, AgeBracket::Thirties, gender, born_1990()),
        )
        .await;
    }

    let first = builders::person("Early");
    let second = builders::person("Late");
    for person in [&first, &second] {
        harness.store.seed_person((*person).clone()).await;
        let outcome = harness
            .registration
            .register(builders::solo_request(
                &event,
                person,
                AgeBracket::Thirties,
                Gender::Male,
                born_1990(),
            ))
            .await
            .unwrap();
        assert_eq!(outcome, RegistrationOutcome::Waitlisted);
    }

    let invited = harness.waitlist.promote_scan(event.id, AgeBracket::Thirties).await.unwrap();
    assert_eq!(invited, 2);
    settle_background_tasks().await;

    let invitations: Vec<String> = harness
        .notifier
        .sent()
        .into_iter()
        .filter_map(|n| match n {
            meetlocal_core::notification::Notification::WaitlistSlotAvailable {
                recipient, ..
            } => Some(recipient.email),
            _ => None,
        })
        .collect();
    assert_eq!(invitations, vec![first.email.clone(), second.email.clone()]);
}

/// A waitlist entry disappears once its party pays into a freed slot.
#[tokio::test]
async fn settlement_clears_the_waitlist_entry() {
    let harness = harness();
    let event = builders::event_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 10);
    harness.store.insert_event(&event).await.unwrap();

    for (name, gender) in
        [("Milo", Gender::Male), ("Maks", Gender::Male), ("Fay", Gender::Female)]
    {
        let person = builders::person(name);
        harness.store.seed_person(person.clone()).await;
        common::register_and_confirm(
            &harness,
            builders::solo_request(&event, &person, AgeBracket::Thirties, gender, born_1990()),
        )
        .await;
    }

    let marc = builders::person("Marc");
    harness.store.seed_person(marc.clone()).await;
    let outcome = harness
        .registration
        .register(builders::solo_request(
            &event,
            &marc,
            AgeBracket::Thirties,
            Gender::Male,
            born_1990(),
        ))
        .await
        .unwrap();
    assert_eq!(outcome, RegistrationOutcome::Waitlisted);

    // Two registered women rebalance the bracket (3M/3F), then the scan
    // creates Marc's payment obligation.
    for name in ["Gina", "Hana"] {
        let person = builders::person(name);
        harness.store.seed_person(person.clone()).await;
        common::register_and_confirm(
            &harness,
            builders::solo_request(
                &event,
                &person,
                AgeBracket::Thirties,
                Gender::Female,
                born_1990(),
            ),
        )
        .await;
    }
    harness.waitlist.promote_scan(event.id, AgeBracket::Thirties).await.unwrap();

    let marc_payment = harness
        .store
        .payments_for_event(event.id)
        .await
        .into_iter()
        .find(|p| p.payer_id == marc.id)
        .expect("the scan creates the payment obligation");

    // Paying clears the queue entry and registers the party. 4M/3F is
    // 57% male, within the ceiling.
    let outcome = harness.payments.confirm(marc_payment.id).await.unwrap();
    assert_eq!(outcome, meetlocal_core::ConfirmationOutcome::Confirmed);
    assert!(harness
        .store
        .waitlist_entries(event.id, AgeBracket::Thirties)
        .await
        .unwrap()
        .is_empty());
    let marc_row = harness
        .store
        .participants_for_event(event.id)
        .await
        .into_iter()
        .find(|p| p.person_id == marc.id)
        .unwrap();
    assert_eq!(marc_row.status, ParticipantStatus::Registered);
}

async fn waitlisted_registration(
    harness: &Harness,
    event_id: &meetlocal_core::types::EventId,
    person: &Person,
) -> meetlocal_core::types::ParticipantId {
    // Saturate the male share (2M/1F) so this male registration defers.
    let event = harness.store.event(*event_id).await.unwrap().unwrap();
    for (name, gender) in
        [("Seed1", Gender::Male), ("Seed2", Gender::Male), ("Seed3", Gender::Female)]
    {
        let seeded = builders::person(name);
        harness.store.seed_person(seeded.clone()).await;
        common::register_and_confirm(
            harness,
            builders::solo_request(&event, &seeded, AgeBracket::Thirties, gender, born_1990()),
        )
        .await;
    }
    let outcome = harness
        .registration
        .register(builders::solo_request(
            &event,
            person,
            AgeBracket::Thirties,
            Gender::Male,
            born_1990(),
        ))
        .await
        .unwrap();
    assert_eq!(outcome, RegistrationOutcome::Waitlisted);
    harness
        .store
        .participants_for_event(*event_id)
        .await
        .into_iter()
        .find(|p| p.person_id == person.id)
        .unwrap()
        .id
}
