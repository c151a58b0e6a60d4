use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderTotals, PaymentStatus, TransferNotice},
    traits::{AccountApiError, AccountManagement, TransferOutcome},
};

/// This trait defines the highest level of behaviour for backends supporting the storefront payment engine.
///
/// This behaviour includes:
/// * Atomically storing checkout submissions as priced order records.
/// * Reconciling incoming transfer notifications against pending orders.
/// * Payment-status transitions, including the expiry sweep for overdue transfer payments.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + AccountManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a checkout submission and, in a single atomic transaction, stores the order and its line items,
    /// assigns the order number and, for transfer-based methods, the payment reference.
    ///
    /// Returns the stored order record.
    async fn insert_order(&self, order: NewOrder, totals: OrderTotals) -> Result<Order, PaymentGatewayError>;

    /// Applies an incoming transfer notification in a single atomic transaction:
    /// * the transfer is recorded; a previously seen `txid` short-circuits to [`TransferOutcome::Duplicate`],
    /// * the payment reference (explicit, or scavenged from the memo) is matched against pending orders,
    /// * on a full-amount match the order's payment status moves `pending → paid` and the fulfilment status to
    ///   `confirmed`.
    async fn apply_transfer(&self, notice: TransferNotice) -> Result<TransferOutcome, PaymentGatewayError>;

    /// Transitions an order's payment status. Only `pending` orders can be transitioned; anything else is a
    /// forbidden modification.
    async fn update_payment_status(
        &self,
        order_number: &OrderNumber,
        status: PaymentStatus,
    ) -> Result<Order, PaymentGatewayError>;

    /// Marks transfer-based orders that have been pending for longer than `window` as failed and cancels them.
    ///
    /// The result is the list of orders that were expired.
    async fn expire_overdue_orders(&self, window: Duration) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The checkout submission is invalid. {0}")]
    InvalidOrder(String),
    #[error("{0}")]
    AccountError(#[from] AccountApiError),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("Illegal payment status change. {0}")]
    PaymentStatusUpdateError(String),
    #[error("Cannot record transfer, since it already exists with txid {0}")]
    TransferAlreadyExists(String),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
