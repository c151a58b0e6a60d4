use thiserror::Error;

use crate::{
    db_types::{Order, OrderItem, OrderNumber, TrackingEvent},
    spe_api::order_objects::OrderQueryFilter,
};

/// Read-side queries over orders and their satellite records. This is all the storefront needs to render the order
/// list, the order detail page and the tracking timeline.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, AccountApiError>;

    /// Fetches the order for the customer-facing order number, e.g. `ORD-000123`.
    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, AccountApiError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, AccountApiError>;

    /// Fetches orders according to the criteria in `query`, most recent first, honouring the query's pagination.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError>;

    /// The number of orders the query would match without pagination.
    async fn count_orders(&self, query: OrderQueryFilter) -> Result<i64, AccountApiError>;

    /// The carrier timeline for an order, oldest hop first.
    async fn fetch_tracking_events(&self, order_id: i64) -> Result<Vec<TrackingEvent>, AccountApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The order {0} does not exist")]
    OrderDoesNotExist(OrderNumber),
    #[error("Could not interpret the query. {0}")]
    QueryError(String),
}

impl AccountApiError {
    pub fn dne(order_number: OrderNumber) -> Self {
        AccountApiError::OrderDoesNotExist(order_number)
    }
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}
