//! Admission and cancellation policy configuration.
//!
//! All threshold values the engine consults live in explicit policy objects
//! handed to the services at construction time, so tests can vary policy
//! without touching ambient state.

use crate::types::Money;
use chrono_tz::Tz;

/// Policy knobs for admission decisions and payment sizing
#[derive(Clone, Debug)]
pub struct AdmissionPolicy {
    /// Registered-count per bracket at which the gender-ratio check
    /// engages. Below `ratio_threshold - party_size` the ratio is not
    /// evaluated.
    pub ratio_threshold: u32,
    /// Maximum share (percent) either gender may hold of the
    /// male+female pool in a bracket
    pub max_gender_share: u32,
    /// Per-person registration fee
    pub base_fee: Money,
    /// Smallest amount the payment collaborator can charge; totals below
    /// this finalize free of charge
    pub min_charge: Money,
    /// Percentage of capacity at which the one-shot operator warning fires
    pub capacity_warning_percent: u32,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            ratio_threshold: 10,
            max_gender_share: 60,
            base_fee: Money::from_euros(20),
            min_charge: Money::from_cents(50),
            capacity_warning_percent: 90,
        }
    }
}

/// Policy knobs for cancellations and goodwill vouchers
#[derive(Clone, Debug)]
pub struct CancellationPolicy {
    /// A cancellation is "timely" strictly more than this many hours
    /// before the event's local start
    pub cutoff_hours: i64,
    /// Voucher validity from the moment of issuance
    pub voucher_validity_months: u32,
    /// Voucher currency, lowercase ISO code
    pub voucher_currency: String,
    /// Time zone events are scheduled in
    pub venue_time_zone: Tz,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            cutoff_hours: 24,
            voucher_validity_months: 24,
            voucher_currency: "eur".to_string(),
            venue_time_zone: chrono_tz::Europe::Berlin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_production_values() {
        let policy = AdmissionPolicy::default();
        assert_eq!(policy.max_gender_share, 60);
        assert_eq!(policy.base_fee, Money::from_euros(20));
        assert_eq!(policy.min_charge, Money::from_cents(50));
        assert_eq!(policy.capacity_warning_percent, 90);

        let cancellation = CancellationPolicy::default();
        assert_eq!(cancellation.cutoff_hours, 24);
        assert_eq!(cancellation.voucher_validity_months, 24);
        assert_eq!(cancellation.venue_time_zone, chrono_tz::Europe::Berlin);
    }
}
