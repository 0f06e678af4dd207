//! Payment collaborator interface.
//!
//! Abstraction over Stripe-like payment processors. The engine never
//! moves money itself: it computes amounts, asks the collaborator for
//! charge intents, coupon arithmetic and voucher registration, and
//! treats everything behind the trait as a black box.

use crate::types::{Money, PaymentId, PersonId};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

/// Payment collaborator result
pub type GatewayResult<T> = Result<T, PaymentGatewayError>;

/// Payment collaborator error
#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentGatewayError {
    /// The charge was declined
    #[error("charge declined: {reason}")]
    Declined {
        /// Decline reason
        reason: String,
    },
    /// The coupon code is unknown, inactive or exhausted
    #[error("invalid coupon")]
    InvalidCoupon,
    /// The collaborator did not answer in time
    #[error("gateway timeout")]
    Timeout,
    /// Other error
    #[error("payment error: {message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// A charge the client must complete with the collaborator
#[derive(Debug, Clone)]
pub struct ChargeIntent {
    /// Collaborator-side intent identifier
    pub intent_id: String,
    /// Secret the client uses to complete the charge
    pub client_secret: String,
    /// Amount to be charged
    pub amount: Money,
}

/// A validated coupon and the discount it grants against a base amount
#[derive(Debug, Clone)]
pub struct CouponDiscount {
    /// Collaborator-side promotion identifier
    pub promo_id: String,
    /// The code as entered
    pub code: String,
    /// Discount amount, already clamped to the base amount
    pub amount_off: Money,
}

/// A voucher to register with the collaborator's coupon ledger
#[derive(Debug, Clone)]
pub struct VoucherOrder {
    /// Single-use redemption code
    pub code: String,
    /// Credit amount
    pub amount: Money,
    /// Lowercase ISO currency code
    pub currency: String,
    /// Last redeemable instant
    pub redeem_by: DateTime<Utc>,
    /// Owning person
    pub person_id: PersonId,
    /// Display name attached to the coupon
    pub name: String,
}

/// Payment gateway trait
///
/// Abstraction over payment processors like Stripe. All methods are
/// black boxes returning identifiers/amounts or a payment error.
pub trait PaymentGateway: Send + Sync {
    /// Creates a charge intent for a pending payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator refuses the charge.
    fn create_charge(
        &self,
        payment_id: PaymentId,
        amount: Money,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<ChargeIntent>> + Send + '_>>;

    /// Validates a coupon code against a base amount. Unknown or
    /// inactive codes yield `Ok(None)` rather than an error, matching
    /// the lenient checkout behavior.
    ///
    /// # Errors
    ///
    /// Returns an error only on collaborator failure.
    fn compute_discount(
        &self,
        code: &str,
        base: Money,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<Option<CouponDiscount>>> + Send + '_>>;

    /// Marks a coupon as redeemed outside a charge (free checkout).
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator refuses the redemption.
    fn redeem_coupon(
        &self,
        promo_id: &str,
        person_id: PersonId,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<()>> + Send + '_>>;

    /// Registers a single-use, amount-based voucher with the
    /// collaborator's coupon ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the voucher could not be registered.
    fn issue_voucher(
        &self,
        order: &VoucherOrder,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<()>> + Send + '_>>;
}
