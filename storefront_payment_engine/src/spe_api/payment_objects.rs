use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spg_common::Money;

/// Payment instructions for a transfer-based order: what to pay, the reference to quote, the QR code that encodes
/// both, and how long the instructions remain valid. Derived on demand; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub amount: Money,
    pub payment_ref: String,
    pub qr_url: String,
    pub expired_at: DateTime<Utc>,
}
