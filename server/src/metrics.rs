//! Business metrics for the admissions platform.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `meetlocal_registrations_total{outcome}` - Registrations by outcome
//!   (`payment_required`, `waitlisted`)
//! - `meetlocal_payments_total{outcome}` - Payment settlements by outcome
//!   (`confirmed`, `already_paid`, `waitlisted`, `finalized_free`)
//! - `meetlocal_cancellations_total{voucher}` - Cancellations, labelled by
//!   whether a voucher was issued

use metrics::describe_counter;

/// Initialize and register all business metrics descriptions.
///
/// Called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "meetlocal_registrations_total",
        "Total registration requests by outcome (payment_required, waitlisted)"
    );
    describe_counter!(
        "meetlocal_payments_total",
        "Total payment settlements by outcome (confirmed, already_paid, waitlisted, finalized_free)"
    );
    describe_counter!(
        "meetlocal_cancellations_total",
        "Total cancellations, labelled by whether a goodwill voucher was issued"
    );
}
