//! End-to-end admission flow tests over the in-memory store.
//!
//! Drives the registration → payment → cancellation pipeline the way the
//! HTTP layer does, asserting the outcomes and the persisted state.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // test code

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{harness_at, policy_with_threshold, register_and_confirm, settle_background_tasks};
use meetlocal_core::error::AdmissionError;
use meetlocal_core::store::AdmissionStore;
use meetlocal_core::types::{AgeBracket, Gender, ParticipantStatus, RegistrationOutcome};
use meetlocal_core::{AdmissionPolicy, CancellationPolicy, ConfirmationOutcome};
use meetlocal_testing::builders;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A "now" comfortably more than 24h before the test event (2025-06-10
/// 19:00 Berlin)
fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn event_date() -> NaiveDate {
    date(2025, 6, 10)
}

const BORN_1990: fn() -> NaiveDate = || NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();

/// Spec §8 end-to-end scenario: capacity 2, ratio threshold 4. Two solo
/// registrations of different genders admit and pay; a third is rejected
/// with capacity exceeded; cancelling the first more than 24h before the
/// event yields a voucher and triggers an (empty) promote scan.
#[tokio::test]
async fn two_seat_event_fills_and_rejects_then_voucher_on_cancel() {
    let harness =
        harness_at(now(), policy_with_threshold(4), CancellationPolicy::default());
    let event = builders::event_on(event_date(), 2);
    harness.store.insert_event(&event).await.unwrap();

    let anna = builders::person("Anna");
    let ben = builders::person("Ben");
    let cara = builders::person("Cara");
    for person in [&anna, &ben, &cara] {
        harness.store.seed_person(person.clone()).await;
    }

    register_and_confirm(
        &harness,
        builders::solo_request(&event, &anna, AgeBracket::Thirties, Gender::Female, BORN_1990()),
    )
    .await;
    register_and_confirm(
        &harness,
        builders::solo_request(&event, &ben, AgeBracket::Thirties, Gender::Male, BORN_1990()),
    )
    .await;
    assert_eq!(harness.store.registered_count(event.id).await.unwrap(), 2);

    // Third registration bounces off the capacity gate before any write.
    let err = harness
        .registration
        .register(builders::solo_request(
            &event,
            &cara,
            AgeBracket::Thirties,
            Gender::Female,
            BORN_1990(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, AdmissionError::CapacityExceeded));
    assert_eq!(harness.store.participants_for_event(event.id).await.len(), 2);

    // Timely cancellation: voucher for the per-person share (solo → full fee).
    let outcome = harness.cancellation.cancel(anna.id, event.id).await.unwrap();
    let voucher = outcome.voucher.expect("timely cancellation should yield a voucher");
    assert_eq!(voucher.amount, AdmissionPolicy::default().base_fee);
    assert!(voucher.code.starts_with("MEET-"));

    settle_background_tasks().await;
    // Nobody was waitlisted, so the promote scan invited no one.
    assert_eq!(harness.notifier.sent_with_template("waitlist_slot_available"), 0);
    assert_eq!(harness.store.registered_count(event.id).await.unwrap(), 1);
}

/// Once a bracket passes the threshold, a candidate that would push their
/// gender over 60% is waitlisted, not rejected; the party rows carry the
/// explicit waitlisted status plus one queue entry.
#[tokio::test]
async fn ratio_contention_routes_to_waitlist() {
    let harness =
        harness_at(now(), policy_with_threshold(4), CancellationPolicy::default());
    let event = builders::event_on(event_date(), 10);
    harness.store.insert_event(&event).await.unwrap();

    let seeds = [
        ("Milo", Gender::Male),
        ("Maks", Gender::Male),
        ("Fay", Gender::Female),
    ];
    for (name, gender) in seeds {
        let person = builders::person(name);
        harness.store.seed_person(person.clone()).await;
        register_and_confirm(
            &harness,
            builders::solo_request(&event, &person, AgeBracket::Thirties, gender, BORN_1990()),
        )
        .await;
    }

    // 2M/1F registered; a third male would be 3/4 = 75% > 60%.
    let marc = builders::person("Marc");
    harness.store.seed_person(marc.clone()).await;
    let outcome = harness
        .registration
        .register(builders::solo_request(
            &event,
            &marc,
            AgeBracket::Thirties,
            Gender::Male,
            BORN_1990(),
        ))
        .await
        .unwrap();
    assert_eq!(outcome, RegistrationOutcome::Waitlisted);

    let entries =
        harness.store.waitlist_entries(event.id, AgeBracket::Thirties).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].person_id, marc.id);

    let marc_row = harness
        .store
        .participants_for_event(event.id)
        .await
        .into_iter()
        .find(|p| p.person_id == marc.id)
        .unwrap();
    assert_eq!(marc_row.status, ParticipantStatus::Waitlisted);

    // A female candidate still gets through (2/4 female = 50%).
    let femke = builders::person("Femke");
    harness.store.seed_person(femke.clone()).await;
    let outcome = harness
        .registration
        .register(builders::solo_request(
            &event,
            &femke,
            AgeBracket::Thirties,
            Gender::Female,
            BORN_1990(),
        ))
        .await
        .unwrap();
    assert!(matches!(outcome, RegistrationOutcome::PaymentRequired { .. }));
}

/// The same person cannot hold two active registrations for one event and
/// bracket.
#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let harness =
        harness_at(now(), policy_with_threshold(10), CancellationPolicy::default());
    let event = builders::event_on(event_date(), 10);
    harness.store.insert_event(&event).await.unwrap();

    let anna = builders::person("Anna");
    harness.store.seed_person(anna.clone()).await;

    let first = builders::solo_request(&event, &anna, AgeBracket::Thirties, Gender::Female, BORN_1990());
    harness.registration.register(first.clone()).await.unwrap();

    let err = harness.registration.register(first).await.unwrap_err();
    assert!(matches!(err, AdmissionError::DuplicateRegistration));
}

/// Settling a payment twice is idempotent.
#[tokio::test]
async fn double_confirmation_reports_already_paid() {
    let harness =
        harness_at(now(), policy_with_threshold(10), CancellationPolicy::default());
    let event = builders::event_on(event_date(), 10);
    harness.store.insert_event(&event).await.unwrap();

    let anna = builders::person("Anna");
    harness.store.seed_person(anna.clone()).await;
    let payment_id = register_and_confirm(
        &harness,
        builders::solo_request(&event, &anna, AgeBracket::Thirties, Gender::Female, BORN_1990()),
    )
    .await;

    let second = harness.payments.confirm(payment_id).await.unwrap();
    assert_eq!(second, ConfirmationOutcome::AlreadyPaid);
    assert_eq!(harness.store.registered_count(event.id).await.unwrap(), 1);
}

/// The late re-check at settlement time routes a party back to the
/// waitlist when the last seat was taken in between.
#[tokio::test]
async fn stale_payment_is_waitlisted_at_settlement() {
    let harness =
        harness_at(now(), policy_with_threshold(10), CancellationPolicy::default());
    let event = builders::event_on(event_date(), 1);
    harness.store.insert_event(&event).await.unwrap();

    let anna = builders::person("Anna");
    let ben = builders::person("Ben");
    harness.store.seed_person(anna.clone()).await;
    harness.store.seed_person(ben.clone()).await;

    // Both admitted while the seat was free.
    let anna_payment = common::register_admitted(
        &harness,
        builders::solo_request(&event, &anna, AgeBracket::Thirties, Gender::Female, BORN_1990()),
    )
    .await;
    let ben_payment = common::register_admitted(
        &harness,
        builders::solo_request(&event, &ben, AgeBracket::Thirties, Gender::Male, BORN_1990()),
    )
    .await;

    assert_eq!(harness.payments.confirm(anna_payment).await.unwrap(), ConfirmationOutcome::Confirmed);
    assert_eq!(harness.payments.confirm(ben_payment).await.unwrap(), ConfirmationOutcome::Waitlisted);

    assert_eq!(harness.store.registered_count(event.id).await.unwrap(), 1);
    let entries =
        harness.store.waitlist_entries(event.id, AgeBracket::Thirties).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].person_id, ben.id);
}
