use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, OrderStatusType, PaymentStatus, TrackingEvent};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

//--------------------------------------   OrderQueryFilter    -------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub user_id: Option<i64>,
    pub status: Option<Vec<OrderStatusType>>,
    pub payment_status: Option<PaymentStatus>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// 1-based page number. `None` means no pagination.
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl OrderQueryFilter {
    pub fn for_user(user_id: i64) -> Self {
        Self { user_id: Some(user_id), ..Default::default() }
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    pub fn with_page(mut self, page: i64, limit: i64) -> Self {
        self.page = Some(page.max(1));
        self.limit = Some(limit.clamp(1, MAX_PAGE_SIZE));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.status.is_none()
            && self.payment_status.is_none()
            && self.since.is_none()
            && self.until.is_none()
    }

    /// The `LIMIT`/`OFFSET` pair implied by the filter's pagination, if any.
    pub fn limits(&self) -> Option<(i64, i64)> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        self.page.map(|page| (limit, (page.max(1) - 1) * limit))
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(user_id) = self.user_id {
            write!(f, "user_id: {user_id}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if let Some(payment_status) = self.payment_status {
            write!(f, "payment_status: {payment_status}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        Ok(())
    }
}

//--------------------------------------      OrderList        -------------------------------------------------------
/// One page of a customer's order history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

//--------------------------------------      FullOrder        -------------------------------------------------------
/// An order together with its line items, as returned by the order-detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

//--------------------------------------  OrderStatusSummary   -------------------------------------------------------
/// The slim payload the checkout page polls: just enough to decide whether to keep waiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusSummary {
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payment_ref: Option<String>,
}

impl From<&Order> for OrderStatusSummary {
    fn from(order: &Order) -> Self {
        Self { status: order.status, payment_status: order.payment_status, payment_ref: order.payment_ref.clone() }
    }
}

//--------------------------------------   TrackingReport      -------------------------------------------------------
/// The carrier timeline for an order. Field names follow the carrier feed, not the storefront API conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingReport {
    pub current_status: String,
    pub current_station: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_station: Option<String>,
    pub timeline: Vec<TrackingEvent>,
}

impl TrackingReport {
    /// Builds a report from the stored timeline, oldest hop first. Returns `None` when there are no events yet.
    pub fn from_events(timeline: Vec<TrackingEvent>) -> Option<Self> {
        let last = timeline.last()?;
        Some(Self {
            current_status: last.status.clone(),
            current_station: last.station.clone(),
            next_station: last.next_station.clone(),
            timeline,
        })
    }
}
