use chrono::{DateTime, Duration, Utc};
use spg_common::Money;
use storefront_payment_engine::{
    db_types::{Order, PaymentStatus},
    payment_objects::PaymentInfo,
};

use crate::config::BankConfig;

/// Why payment instructions could not be produced for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentInfoDenied {
    /// The order's payment method has no transfer instructions (COD, gateway methods).
    NotTransfer,
    /// The payment already left the pending state; the instructions have no further existence.
    Settled(PaymentStatus),
    /// The payment window has lapsed. The expiry worker will cancel the order shortly, if it has not already.
    Expired,
}

/// Derives payment instructions for transfer-based orders. Nothing here is persisted: the amount is the order's
/// total, the reference was fixed at checkout, and the QR code and expiry are recomputed from configuration.
#[derive(Clone)]
pub struct PaymentInfoResolver {
    bank: BankConfig,
    window: Duration,
}

impl PaymentInfoResolver {
    pub fn new(bank: BankConfig, window: Duration) -> Self {
        Self { bank, window }
    }

    pub fn resolve(&self, order: &Order, now: DateTime<Utc>) -> Result<PaymentInfo, PaymentInfoDenied> {
        if !order.payment_method.is_transfer() {
            return Err(PaymentInfoDenied::NotTransfer);
        }
        let payment_ref = order.payment_ref.clone().ok_or(PaymentInfoDenied::NotTransfer)?;
        if order.payment_status != PaymentStatus::Pending {
            return Err(PaymentInfoDenied::Settled(order.payment_status));
        }
        let expired_at = order.created_at + self.window;
        if now > expired_at {
            return Err(PaymentInfoDenied::Expired);
        }
        let qr_url = self.qr_url(order.total, &payment_ref);
        Ok(PaymentInfo { amount: order.total, payment_ref, qr_url, expired_at })
    }

    fn qr_url(&self, amount: Money, reference: &str) -> String {
        format!(
            "https://qr.sepay.vn/img?acc={}&bank={}&amount={}&des={}",
            urlencoding::encode(&self.bank.account_number),
            urlencoding::encode(&self.bank.bank_code),
            amount.value(),
            urlencoding::encode(reference)
        )
    }
}
