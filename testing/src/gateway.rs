//! Scriptable payment collaborator.

use meetlocal_core::payment::{
    ChargeIntent, CouponDiscount, GatewayResult, PaymentGateway, PaymentGatewayError, VoucherOrder,
};
use meetlocal_core::types::{Money, PaymentId, PersonId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Mock payment gateway.
///
/// Succeeds by default; individual operations can be scripted to fail,
/// and everything it was asked to do is recorded for assertions.
#[derive(Default)]
pub struct MockPaymentGateway {
    decline_charges: AtomicBool,
    fail_vouchers: AtomicBool,
    coupons: Mutex<HashMap<String, Money>>,
    issued: Mutex<Vec<VoucherOrder>>,
    redeemed: Mutex<Vec<String>>,
}

impl MockPaymentGateway {
    /// Creates a gateway that succeeds at everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent charge creations fail with a decline
    pub fn decline_charges(&self, decline: bool) {
        self.decline_charges.store(decline, Ordering::SeqCst);
    }

    /// Makes subsequent voucher registrations fail
    pub fn fail_vouchers(&self, fail: bool) {
        self.fail_vouchers.store(fail, Ordering::SeqCst);
    }

    /// Registers a coupon code granting a fixed discount
    #[allow(clippy::missing_panics_doc, clippy::unwrap_used)] // mutex cannot be poisoned
    pub fn register_coupon(&self, code: &str, amount_off: Money) {
        self.coupons.lock().unwrap().insert(code.to_string(), amount_off);
    }

    /// Vouchers registered so far
    #[allow(clippy::missing_panics_doc, clippy::unwrap_used)] // mutex cannot be poisoned
    #[must_use]
    pub fn issued_vouchers(&self) -> Vec<VoucherOrder> {
        self.issued.lock().unwrap().clone()
    }

    /// Coupon promotion ids redeemed outside a charge
    #[allow(clippy::missing_panics_doc, clippy::unwrap_used)] // mutex cannot be poisoned
    #[must_use]
    pub fn redeemed_coupons(&self) -> Vec<String> {
        self.redeemed.lock().unwrap().clone()
    }
}

#[allow(clippy::unwrap_used)] // mutexes cannot be poisoned: no panics while held
impl PaymentGateway for MockPaymentGateway {
    fn create_charge(
        &self,
        payment_id: PaymentId,
        amount: Money,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<ChargeIntent>> + Send + '_>> {
        let decline = self.decline_charges.load(Ordering::SeqCst);
        Box::pin(async move {
            if decline {
                return Err(PaymentGatewayError::Declined { reason: "card declined".to_string() });
            }
            let intent_id = format!("mock_pi_{payment_id}");
            Ok(ChargeIntent {
                client_secret: format!("{intent_id}_secret_{}", Uuid::new_v4().simple()),
                intent_id,
                amount,
            })
        })
    }

    fn compute_discount(
        &self,
        code: &str,
        base: Money,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<Option<CouponDiscount>>> + Send + '_>> {
        let code = code.to_string();
        Box::pin(async move {
            let coupons = self.coupons.lock().unwrap();
            Ok(coupons.get(&code).map(|amount_off| CouponDiscount {
                promo_id: format!("promo_{code}"),
                code: code.clone(),
                amount_off: if *amount_off > base { base } else { *amount_off },
            }))
        })
    }

    fn redeem_coupon(
        &self,
        promo_id: &str,
        _person_id: PersonId,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<()>> + Send + '_>> {
        let promo_id = promo_id.to_string();
        Box::pin(async move {
            self.redeemed.lock().unwrap().push(promo_id);
            Ok(())
        })
    }

    fn issue_voucher(
        &self,
        order: &VoucherOrder,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<()>> + Send + '_>> {
        let order = order.clone();
        Box::pin(async move {
            if self.fail_vouchers.load(Ordering::SeqCst) {
                return Err(PaymentGatewayError::Other {
                    message: "voucher ledger unavailable".to_string(),
                });
            }
            self.issued.lock().unwrap().push(order);
            Ok(())
        })
    }
}
