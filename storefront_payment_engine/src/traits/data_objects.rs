use crate::db_types::Order;

/// The result of applying one incoming transfer notification.
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    /// The transfer settled an order; payment status moved `pending → paid`.
    Paid(Order),
    /// This `txid` has been processed before. The recorded match, if any, is returned unchanged and no events
    /// fire again.
    Duplicate { txid: String, order: Option<Order> },
    /// The transfer was recorded, but no pending order could be matched (unknown or absent reference, order
    /// already settled, or the amount does not cover the total).
    Unmatched { reason: String },
}
