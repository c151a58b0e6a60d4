use crate::{
    db_types::{Order, OrderNumber},
    spe_api::order_objects::{FullOrder, OrderList, OrderQueryFilter, OrderStatusSummary, TrackingReport, DEFAULT_PAGE_SIZE},
    traits::{AccountApiError, AccountManagement},
};

/// `AccountApi` provides the read-side order queries: the order list, order detail, the status summary the
/// checkout page polls, and the carrier tracking report.
#[derive(Debug, Clone)]
pub struct AccountApi<B> {
    db: B,
}

impl<B> AccountApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub async fn order_by_id(&self, id: i64) -> Result<Option<Order>, AccountApiError> {
        self.db.fetch_order_by_id(id).await
    }

    pub async fn order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, AccountApiError> {
        self.db.fetch_order_by_number(number).await
    }

    /// The full order record with its line items.
    pub async fn order_detail(&self, id: i64) -> Result<Option<FullOrder>, AccountApiError> {
        let Some(order) = self.db.fetch_order_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(Some(FullOrder { order, items }))
    }

    /// One page of orders matching the filter, plus the unpaginated match count.
    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<OrderList, AccountApiError> {
        let total = self.db.count_orders(query.clone()).await?;
        let orders = self.db.search_orders(query.clone()).await?;
        let (limit, _) = query.limits().unwrap_or((DEFAULT_PAGE_SIZE, 0));
        Ok(OrderList { orders, total, page: query.page.unwrap_or(1), limit })
    }

    /// The slim status payload polled by the checkout page.
    pub async fn status_summary(&self, number: &OrderNumber) -> Result<Option<OrderStatusSummary>, AccountApiError> {
        let order = self.db.fetch_order_by_number(number).await?;
        Ok(order.as_ref().map(OrderStatusSummary::from))
    }

    /// The carrier timeline for an order. `None` when the order does not exist or no tracking data has arrived.
    pub async fn tracking_report(&self, order_id: i64) -> Result<Option<TrackingReport>, AccountApiError> {
        let events = self.db.fetch_tracking_events(order_id).await?;
        Ok(TrackingReport::from_events(events))
    }
}
