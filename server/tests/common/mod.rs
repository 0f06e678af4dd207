//! Shared harness wiring the engine services over the in-memory store.

#![allow(dead_code)] // not every test file uses every helper
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // test code

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use meetlocal_core::environment::Clock;
use meetlocal_core::notification::Notifier;
use meetlocal_core::payment::PaymentGateway;
use meetlocal_core::store::AdmissionStore;
use meetlocal_core::types::{PaymentId, RegistrationOutcome, RegistrationRequest};
use meetlocal_core::{
    AdmissionEvaluator, AdmissionPolicy, CancellationPolicy, CancellationService, CapacityMonitor,
    ConfirmationOutcome, PaymentService, RegistrationService, WaitlistManager,
};
use meetlocal_testing::{FixedClock, MemoryStore, MockPaymentGateway, RecordingNotifier};
use std::sync::Arc;

/// Venue time zone used throughout the tests
pub const TZ: Tz = chrono_tz::Europe::Berlin;

/// Fully wired engine over deterministic collaborators
pub struct Harness {
    pub store: MemoryStore,
    pub gateway: Arc<MockPaymentGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub registration: RegistrationService,
    pub payments: PaymentService,
    pub cancellation: CancellationService,
    pub waitlist: Arc<WaitlistManager>,
    pub monitor: Arc<CapacityMonitor>,
}

/// Builds the harness with a fixed "now" and the given policies
pub fn harness_at(
    now: DateTime<Utc>,
    admission: AdmissionPolicy,
    cancellation: CancellationPolicy,
) -> Harness {
    let store = MemoryStore::new();
    let gateway = Arc::new(MockPaymentGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now));

    let store_dyn: Arc<dyn AdmissionStore> = Arc::new(store.clone());
    let gateway_dyn: Arc<dyn PaymentGateway> = gateway.clone();
    let notifier_dyn: Arc<dyn Notifier> = notifier.clone();

    let evaluator = AdmissionEvaluator::new(admission.clone());
    let registration = RegistrationService::new(
        Arc::clone(&store_dyn),
        evaluator.clone(),
        Arc::clone(&clock),
        TZ,
    );
    let monitor = Arc::new(CapacityMonitor::new(
        Arc::clone(&store_dyn),
        Arc::clone(&notifier_dyn),
        admission.capacity_warning_percent,
    ));
    let payments = PaymentService::new(
        Arc::clone(&store_dyn),
        Arc::clone(&gateway_dyn),
        Arc::clone(&notifier_dyn),
        evaluator,
        Arc::clone(&monitor),
        Arc::clone(&clock),
        TZ,
    );
    let waitlist = Arc::new(WaitlistManager::new(
        Arc::clone(&store_dyn),
        Arc::clone(&notifier_dyn),
        admission.clone(),
    ));
    let cancellation = CancellationService::new(
        store_dyn,
        gateway_dyn,
        notifier_dyn,
        Arc::clone(&waitlist),
        clock,
        cancellation,
    );

    Harness { store, gateway, notifier, registration, payments, cancellation, waitlist, monitor }
}

/// An `AdmissionPolicy` with a small ratio threshold, convenient for tests
#[must_use]
pub fn policy_with_threshold(ratio_threshold: u32) -> AdmissionPolicy {
    AdmissionPolicy { ratio_threshold, ..AdmissionPolicy::default() }
}

/// Registers a party expecting admission, returning the pending payment
pub async fn register_admitted(harness: &Harness, request: RegistrationRequest) -> PaymentId {
    match harness.registration.register(request).await.expect("registration should succeed") {
        RegistrationOutcome::PaymentRequired { payment_id, .. } => payment_id,
        RegistrationOutcome::Waitlisted => panic!("expected admission, got waitlist"),
    }
}

/// Registers and settles a party end to end
pub async fn register_and_confirm(harness: &Harness, request: RegistrationRequest) -> PaymentId {
    let payment_id = register_admitted(harness, request).await;
    let outcome = harness.payments.confirm(payment_id).await.expect("confirm should succeed");
    assert_eq!(outcome, ConfirmationOutcome::Confirmed);
    payment_id
}

/// Lets fire-and-forget tasks spawned by the services run to completion
pub async fn settle_background_tasks() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}
