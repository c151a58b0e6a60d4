use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spg_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(pub String);

//--------------------------------------     OrderNumber       -------------------------------------------------------
/// The human-readable, unique order identifier (`ORD-000123`). This is what customers see, what they quote in
/// support requests, and what the payment reference is derived from. It is distinct from the internal row id.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    PaymentMethod      -------------------------------------------------------
/// The fixed set of payment methods the storefront offers at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// The customer's stored-value wallet.
    Wallet,
    Paypal,
    Zalopay,
    /// Manual bank transfer, reconciled by payment reference.
    Sepay,
}

impl PaymentMethod {
    /// Transfer-based methods require payment instructions (reference, QR code, expiry) and are settled
    /// asynchronously by observing incoming transfers.
    pub fn is_transfer(&self) -> bool {
        matches!(self, PaymentMethod::Sepay)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cod => write!(f, "cod"),
            PaymentMethod::Wallet => write!(f, "wallet"),
            PaymentMethod::Paypal => write!(f, "paypal"),
            PaymentMethod::Zalopay => write!(f, "zalopay"),
            PaymentMethod::Sepay => write!(f, "sepay"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "wallet" => Ok(Self::Wallet),
            "paypal" => Ok(Self::Paypal),
            "zalopay" => Ok(Self::Zalopay),
            "sepay" => Ok(Self::Sepay),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// No settlement has been observed yet.
    Pending,
    /// The payment has been received in full.
    Paid,
    /// The payment window lapsed, or settlement was rejected.
    Failed,
    /// The payment was returned to the customer.
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// Fulfillment status of an order. The engine only ever advances `Pending → Confirmed` (on payment) and
/// `Pending → Cancelled` (on payment expiry); the remaining transitions belong to operations flows that feed the
/// same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    Pending,
    Confirmed,
    Processing,
    Shipping,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Confirmed => "confirmed",
            OrderStatusType::Processing => "processing",
            OrderStatusType::Shipping => "shipping",
            OrderStatusType::Delivered => "delivered",
            OrderStatusType::Completed => "completed",
            OrderStatusType::Cancelled => "cancelled",
            OrderStatusType::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipping" => Ok(Self::Shipping),
            "delivered" => Ok(Self::Delivered),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------   ShippingAddress     -------------------------------------------------------
/// The shipping address snapshot captured at checkout. It is denormalised onto the order record so that later
/// address-book edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    /// Free-text street address.
    pub address: String,
    pub province: String,
    pub district: String,
    pub ward: String,
    pub note: Option<String>,
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub discount: Money,
    /// Always `subtotal - discount + shipping_fee`, computed server-side at checkout.
    pub total: Money,
    #[sqlx(flatten)]
    #[serde(rename = "shippingAddress")]
    pub shipping: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatusType,
    /// The reference the payer must include in a transfer memo; set at insert time for transfer-based methods.
    pub payment_ref: Option<String>,
    pub tracking_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderItem        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// `unit_price * quantity`, computed server-side.
    pub subtotal: Money,
}

//--------------------------------------       NewOrder        -------------------------------------------------------
/// A checkout submission, before pricing. All money fields are computed by the engine; the client has no say.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub payment_method: PaymentMethod,
    pub shipping: ShippingAddress,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// The money columns of an order as computed by the pricing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub discount: Money,
    pub total: Money,
}

//--------------------------------------    TransferNotice     -------------------------------------------------------
/// An incoming bank-transfer notification, as reported by the payment provider's webhook. `txid` is the bank-side
/// transaction id and makes processing idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferNotice {
    pub txid: String,
    /// The structured payment reference, when the provider extracted one.
    pub reference: Option<String>,
    /// The raw transfer memo. Scanned for a reference when `reference` is absent.
    pub memo: Option<String>,
    pub amount: Money,
}

impl TransferNotice {
    pub fn new<S: Into<String>>(txid: S, amount: Money) -> Self {
        Self { txid: txid.into(), reference: None, memo: None, amount }
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_memo<S: Into<String>>(mut self, memo: S) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// A recorded transfer row. Kept even when unmatched, so that support can reconcile stray payments manually.
#[derive(Debug, Clone, FromRow)]
pub struct TransferPayment {
    pub id: i64,
    pub txid: String,
    pub reference: Option<String>,
    pub memo: Option<String>,
    pub amount: Money,
    pub order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------         User          -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
}

//--------------------------------------   AuthProviderLink    -------------------------------------------------------
/// Links a third-party identity (keyed by provider + provider-subject-id) to a local user. `value` carries the
/// provider-side email and is updated in place when it changes on the provider.
#[derive(Debug, Clone, FromRow)]
pub struct AuthProviderLink {
    pub id: i64,
    pub provider: String,
    pub subject: String,
    pub value: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    TrackingEvent      -------------------------------------------------------
/// One hop of the carrier timeline for a shipped order. Fed by operations integrations; the engine only reads.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TrackingEvent {
    #[serde(skip_serializing, default)]
    pub id: i64,
    #[serde(skip_serializing, default)]
    pub order_id: i64,
    pub time: DateTime<Utc>,
    pub status: String,
    pub description: String,
    pub station: String,
    /// The next planned station, when the carrier reported one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_station: Option<String>,
}
