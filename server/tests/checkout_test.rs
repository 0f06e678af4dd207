//! Checkout, coupon and minimum-charge tests.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // test code

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{harness_at, policy_with_threshold, register_admitted, settle_background_tasks};
use meetlocal_core::error::PaymentError;
use meetlocal_core::store::AdmissionStore;
use meetlocal_core::types::{AgeBracket, Gender, Money};
use meetlocal_core::{CancellationPolicy, CheckoutOutcome, ConfirmationOutcome};
use meetlocal_testing::builders;

fn born_1990() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn checkout_without_coupon_requires_a_charge() {
    let harness = harness_at(now(), policy_with_threshold(10), CancellationPolicy::default());
    let event = builders::event_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 10);
    harness.store.insert_event(&event).await.unwrap();
    let anna = builders::person("Anna");
    harness.store.seed_person(anna.clone()).await;

    let payment_id = register_admitted(
        &harness,
        builders::solo_request(&event, &anna, AgeBracket::Thirties, Gender::Female, born_1990()),
    )
    .await;

    let outcome = harness.payments.checkout(payment_id, None).await.unwrap();
    let CheckoutOutcome::RequiresPayment { price, client_secret } = outcome else {
        panic!("expected a charge");
    };
    assert_eq!(price.original, Money::from_euros(20));
    assert_eq!(price.discount, Money::ZERO);
    assert_eq!(price.due, Money::from_euros(20));
    assert!(!client_secret.is_empty());
}

/// A partial coupon reduces the due amount; the charge still happens.
#[tokio::test]
async fn partial_coupon_discounts_the_charge() {
    let harness = harness_at(now(), policy_with_threshold(10), CancellationPolicy::default());
    let event = builders::event_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 10);
    harness.store.insert_event(&event).await.unwrap();
    let anna = builders::person("Anna");
    harness.store.seed_person(anna.clone()).await;
    harness.gateway.register_coupon("SPRING5", Money::from_euros(5));

    let payment_id = register_admitted(
        &harness,
        builders::solo_request(&event, &anna, AgeBracket::Thirties, Gender::Female, born_1990()),
    )
    .await;

    let outcome = harness.payments.checkout(payment_id, Some("SPRING5")).await.unwrap();
    let CheckoutOutcome::RequiresPayment { price, .. } = outcome else {
        panic!("expected a charge");
    };
    assert_eq!(price.discount, Money::from_euros(5));
    assert_eq!(price.due, Money::from_euros(15));
}

/// A coupon covering the whole fee drops the total below the minimum
/// charge: the payment finalizes free, the coupon is redeemed, and the
/// party is registered without a charge.
#[tokio::test]
async fn full_coupon_finalizes_free_of_charge() {
    let harness = harness_at(now(), policy_with_threshold(10), CancellationPolicy::default());
    let event = builders::event_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 10);
    harness.store.insert_event(&event).await.unwrap();
    let anna = builders::person("Anna");
    harness.store.seed_person(anna.clone()).await;
    harness.gateway.register_coupon("MEET-FULLFEE", Money::from_euros(20));

    let payment_id = register_admitted(
        &harness,
        builders::solo_request(&event, &anna, AgeBracket::Thirties, Gender::Female, born_1990()),
    )
    .await;

    let outcome = harness.payments.checkout(payment_id, Some("MEET-FULLFEE")).await.unwrap();
    let CheckoutOutcome::Finalized { price, confirmation } = outcome else {
        panic!("expected free finalization");
    };
    assert_eq!(price.due, Money::ZERO);
    assert_eq!(confirmation, ConfirmationOutcome::Confirmed);
    assert_eq!(harness.gateway.redeemed_coupons(), vec!["promo_MEET-FULLFEE".to_string()]);
    assert_eq!(harness.store.registered_count(event.id).await.unwrap(), 1);
    settle_background_tasks().await;
}

/// Unknown coupon codes are ignored rather than failing the checkout.
#[tokio::test]
async fn unknown_coupons_are_ignored() {
    let harness = harness_at(now(), policy_with_threshold(10), CancellationPolicy::default());
    let event = builders::event_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 10);
    harness.store.insert_event(&event).await.unwrap();
    let anna = builders::person("Anna");
    harness.store.seed_person(anna.clone()).await;

    let payment_id = register_admitted(
        &harness,
        builders::solo_request(&event, &anna, AgeBracket::Thirties, Gender::Female, born_1990()),
    )
    .await;

    let outcome = harness.payments.checkout(payment_id, Some("NOPE")).await.unwrap();
    let CheckoutOutcome::RequiresPayment { price, .. } = outcome else {
        panic!("expected a charge");
    };
    assert_eq!(price.due, Money::from_euros(20));
}

/// Checking out a payment for an event that already took place fails.
#[tokio::test]
async fn checkout_after_the_event_date_fails() {
    // The clock sits one day past the event date.
    let harness = harness_at(
        Utc.with_ymd_and_hms(2025, 6, 11, 8, 0, 0).unwrap(),
        policy_with_threshold(10),
        CancellationPolicy::default(),
    );
    let event = builders::event_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 10);
    harness.store.insert_event(&event).await.unwrap();
    let ben = builders::person("Ben");
    harness.store.seed_person(ben.clone()).await;

    let payment_id = register_admitted(
        &harness,
        builders::solo_request(&event, &ben, AgeBracket::Thirties, Gender::Male, born_1990()),
    )
    .await;

    let err = harness.payments.checkout(payment_id, None).await.unwrap_err();
    assert!(matches!(err, PaymentError::EventAlreadyHeld));
}
