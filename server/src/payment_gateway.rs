//! Mock payment gateway for development deployments.
//!
//! A simplified payment collaborator compatible with services like
//! Stripe. In production this is replaced with the actual payment
//! service integration; the engine only ever sees the trait.

use meetlocal_core::payment::{
    ChargeIntent, CouponDiscount, GatewayResult, PaymentGateway, VoucherOrder,
};
use meetlocal_core::types::{Money, PaymentId, PersonId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

/// Mock payment gateway (always succeeds for development)
#[derive(Clone, Debug, Default)]
pub struct MockPaymentGateway;

impl MockPaymentGateway {
    /// Creates a new mock payment gateway
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new())
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn create_charge(
        &self,
        payment_id: PaymentId,
        amount: Money,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<ChargeIntent>> + Send + '_>> {
        Box::pin(async move {
            let intent_id = format!("mock_pi_{}", Uuid::new_v4().simple());
            tracing::info!(
                %payment_id,
                amount = amount.cents(),
                intent_id = %intent_id,
                "Mock charge intent created"
            );
            Ok(ChargeIntent {
                client_secret: format!("{intent_id}_secret"),
                intent_id,
                amount,
            })
        })
    }

    fn compute_discount(
        &self,
        code: &str,
        _base: Money,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<Option<CouponDiscount>>> + Send + '_>> {
        let code = code.to_string();
        Box::pin(async move {
            // The mock knows no coupon ledger; every code is unknown.
            tracing::info!(code = %code, "Mock coupon lookup, treating as unknown");
            Ok(None)
        })
    }

    fn redeem_coupon(
        &self,
        promo_id: &str,
        person_id: PersonId,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<()>> + Send + '_>> {
        let promo_id = promo_id.to_string();
        Box::pin(async move {
            tracing::info!(promo_id = %promo_id, %person_id, "Mock coupon redeemed");
            Ok(())
        })
    }

    fn issue_voucher(
        &self,
        order: &VoucherOrder,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<()>> + Send + '_>> {
        let order = order.clone();
        Box::pin(async move {
            tracing::info!(
                code = %order.code,
                amount = order.amount.cents(),
                redeem_by = %order.redeem_by,
                "Mock voucher registered"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_charge_success() {
        let gateway = MockPaymentGateway::new();
        let payment_id = PaymentId::new();
        let amount = Money::from_euros(40);

        let intent = gateway.create_charge(payment_id, amount).await.unwrap();
        assert_eq!(intent.amount, amount);
        assert!(intent.intent_id.starts_with("mock_pi_"));
        assert!(intent.client_secret.ends_with("_secret"));
    }

    #[tokio::test]
    async fn test_unknown_coupons_grant_nothing() {
        let gateway = MockPaymentGateway::new();
        let discount = gateway.compute_discount("SUMMER10", Money::from_euros(20)).await.unwrap();
        assert!(discount.is_none());
    }
}
