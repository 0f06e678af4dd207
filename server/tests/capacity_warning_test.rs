//! One-shot capacity warning tests.
//!
//! Crossing the 90% threshold fires exactly one operator warning per
//! event, no matter how many settlements cross it afterwards.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // test code

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{harness_at, policy_with_threshold, register_and_confirm, settle_background_tasks};
use meetlocal_core::store::AdmissionStore;
use meetlocal_core::types::{AgeBracket, Gender};
use meetlocal_core::CancellationPolicy;
use meetlocal_testing::builders;

fn born_1990() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
}

/// Capacity 10: the 9th registration crosses 90% and fires the warning;
/// the 10th fires nothing further.
#[tokio::test]
async fn warning_fires_exactly_once_at_ninety_percent() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    // Alternating genders keep the ratio check satisfied throughout.
    let harness =
        harness_at(now, policy_with_threshold(4), CancellationPolicy::default());
    let event = builders::event_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 10);
    harness.store.insert_event(&event).await.unwrap();

    let ops = builders::operator("Odile");
    harness.store.seed_person(ops.clone()).await;

    for i in 0..8 {
        let person = builders::person(&format!("Guest{i}"));
        harness.store.seed_person(person.clone()).await;
        let gender = if i % 2 == 0 { Gender::Female } else { Gender::Male };
        register_and_confirm(
            &harness,
            builders::solo_request(&event, &person, AgeBracket::Thirties, gender, born_1990()),
        )
        .await;
    }
    settle_background_tasks().await;
    assert_eq!(
        harness.notifier.sent_with_template("capacity_warning"),
        0,
        "8 of 10 is below the threshold"
    );

    // The 9th settlement crosses 90%.
    let ninth = builders::person("Guest9");
    harness.store.seed_person(ninth.clone()).await;
    register_and_confirm(
        &harness,
        builders::solo_request(&event, &ninth, AgeBracket::Thirties, Gender::Female, born_1990()),
    )
    .await;
    settle_background_tasks().await;
    assert_eq!(harness.notifier.sent_with_template("capacity_warning"), 1);

    // Filling the event fires nothing further.
    let tenth = builders::person("Guest10");
    harness.store.seed_person(tenth.clone()).await;
    register_and_confirm(
        &harness,
        builders::solo_request(&event, &tenth, AgeBracket::Thirties, Gender::Male, born_1990()),
    )
    .await;
    settle_background_tasks().await;
    assert_eq!(harness.notifier.sent_with_template("capacity_warning"), 1);

    let event_row = harness.store.event(event.id).await.unwrap().unwrap();
    assert!(event_row.capacity_warning_sent);
}

/// The monitor itself is idempotent: once the flag is claimed, re-checks
/// dispatch nothing.
#[tokio::test]
async fn monitor_rechecks_are_no_ops_after_the_claim() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let harness =
        harness_at(now, policy_with_threshold(4), CancellationPolicy::default());
    let event = builders::event_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 2);
    harness.store.insert_event(&event).await.unwrap();
    harness.store.seed_person(builders::operator("Odile")).await;

    for (i, gender) in [Gender::Female, Gender::Male].into_iter().enumerate() {
        let person = builders::person(&format!("Guest{i}"));
        harness.store.seed_person(person.clone()).await;
        register_and_confirm(
            &harness,
            builders::solo_request(&event, &person, AgeBracket::Thirties, gender, born_1990()),
        )
        .await;
    }
    settle_background_tasks().await;
    assert_eq!(harness.notifier.sent_with_template("capacity_warning"), 1);

    // Manual re-checks claim nothing and send nothing.
    assert!(!harness.monitor.check(event.id).await.unwrap());
    assert!(!harness.monitor.check(event.id).await.unwrap());
    assert_eq!(harness.notifier.sent_with_template("capacity_warning"), 1);
}
