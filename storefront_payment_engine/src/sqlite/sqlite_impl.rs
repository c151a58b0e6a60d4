//! `SqliteDatabase` is a concrete implementation of a storefront payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{create_schema, db_url, new_pool, orders, tracking, transfers, users};
use crate::{
    db_types::{
        AuthProviderLink,
        NewOrder,
        NewUser,
        Order,
        OrderItem,
        OrderNumber,
        OrderStatusType,
        OrderTotals,
        PaymentStatus,
        TrackingEvent,
        TransferNotice,
        User,
    },
    helpers::extract_reference_from_memo,
    spe_api::order_objects::OrderQueryFilter,
    traits::{
        AccountApiError,
        AccountManagement,
        AuthApiError,
        AuthManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        TransferOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder, totals: OrderTotals) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, totals, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] has been saved in the DB with id {}", order.order_number, order.id);
        Ok(order)
    }

    async fn apply_transfer(&self, notice: TransferNotice) -> Result<TransferOutcome, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        if let Some(existing) = transfers::fetch_by_txid(&notice.txid, &mut tx).await? {
            let order = match existing.order_id {
                Some(id) => orders::fetch_order_by_id(id, &mut tx).await?,
                None => None,
            };
            tx.commit().await?;
            debug!("🗃️ Transfer [{}] has been processed before. Returning the recorded match.", notice.txid);
            return Ok(TransferOutcome::Duplicate { txid: notice.txid, order });
        }
        let transfer_id = transfers::insert_transfer(&notice, &mut tx).await?;

        let reference =
            notice.reference.clone().or_else(|| notice.memo.as_deref().and_then(extract_reference_from_memo));
        let Some(reference) = reference else {
            tx.commit().await?;
            return Ok(TransferOutcome::Unmatched { reason: "The notification carries no payment reference".into() });
        };
        let Some(order) = orders::fetch_order_by_payment_ref(&reference, &mut tx).await? else {
            tx.commit().await?;
            return Ok(TransferOutcome::Unmatched { reason: format!("No order carries the reference {reference}") });
        };
        if order.payment_status != PaymentStatus::Pending {
            tx.commit().await?;
            return Ok(TransferOutcome::Unmatched {
                reason: format!("Order [{}] is already {}", order.order_number, order.payment_status),
            });
        }
        if notice.amount < order.total {
            tx.commit().await?;
            return Ok(TransferOutcome::Unmatched {
                reason: format!(
                    "Transfer of {} does not cover the {} total of order [{}]",
                    notice.amount, order.total, order.order_number
                ),
            });
        }
        let paid = orders::set_payment_state(order.id, PaymentStatus::Paid, OrderStatusType::Confirmed, &mut tx).await?;
        transfers::link_order(transfer_id, order.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] is now paid. Transfer [{}] linked.", paid.order_number, notice.txid);
        Ok(TransferOutcome::Paid(paid))
    }

    async fn update_payment_status(
        &self,
        order_number: &OrderNumber,
        status: PaymentStatus,
    ) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(order_number, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(order_number.clone()))?;
        if order.payment_status != PaymentStatus::Pending {
            error!(
                "🗃️ Order [{}] cannot be transitioned from {} to {status}. If there is a valid use case, perform a \
                 manual adjustment now and submit a ticket so that it can be handled properly in the future.",
                order.order_number, order.payment_status
            );
            return Err(PaymentGatewayError::PaymentStatusUpdateError(format!(
                "Order [{}] has status {} instead of 'pending'",
                order.order_number, order.payment_status
            )));
        }
        let new_status = match status {
            PaymentStatus::Paid => OrderStatusType::Confirmed,
            PaymentStatus::Failed => OrderStatusType::Cancelled,
            PaymentStatus::Pending | PaymentStatus::Refunded => {
                return Err(PaymentGatewayError::PaymentStatusUpdateError(format!(
                    "A pending payment cannot move to {status}"
                )))
            },
        };
        let order = orders::set_payment_state(order.id, status, new_status, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] payment is now {status}.", order.order_number);
        Ok(order)
    }

    async fn expire_overdue_orders(&self, window: Duration) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let expired = orders::expire_overdue(window, &mut tx).await?;
        tx.commit().await?;
        Ok(expired)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn count_orders(&self, query: OrderQueryFilter) -> Result<i64, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = orders::count_orders(query, &mut conn).await?;
        Ok(count)
    }

    async fn fetch_tracking_events(&self, order_id: i64) -> Result<Vec<TrackingEvent>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let events = tracking::fetch_events(order_id, &mut conn).await?;
        Ok(events)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        users::fetch_user_by_id(id, &mut conn).await
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        users::fetch_user_by_email(email, &mut conn).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        users::username_exists(username, &mut conn).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        let user = users::insert_user(user, &mut conn).await?;
        debug!("🧑️ User '{}' created with id {}", user.username, user.id);
        Ok(user)
    }

    async fn fetch_provider_link(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<AuthProviderLink>, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        users::fetch_provider_link(provider, subject, &mut conn).await
    }

    async fn upsert_provider_link(
        &self,
        provider: &str,
        subject: &str,
        value: &str,
        user_id: i64,
    ) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        users::upsert_provider_link(provider, subject, value, user_id, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `SPG_DATABASE_URL` for the connection.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        create_schema(&pool).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Appends a carrier tracking event to an order's timeline. This is the ingestion seam for the carrier
    /// integration, which lives outside the storefront API.
    pub async fn record_tracking_event(
        &self,
        order_id: i64,
        status: &str,
        description: &str,
        station: &str,
        next_station: Option<&str>,
    ) -> Result<(), AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        tracking::insert_event(order_id, status, description, station, next_station, &mut conn).await?;
        Ok(())
    }
}
