use log::debug;
use sqlx::{Row, SqliteConnection};

use crate::{
    db_types::{TransferNotice, TransferPayment},
    traits::PaymentGatewayError,
};

pub async fn fetch_by_txid(txid: &str, conn: &mut SqliteConnection) -> Result<Option<TransferPayment>, sqlx::Error> {
    let transfer =
        sqlx::query_as("SELECT * FROM transfer_payments WHERE txid = $1").bind(txid).fetch_optional(conn).await?;
    Ok(transfer)
}

/// Records an incoming transfer. Unmatched transfers are kept too, so support can reconcile stray payments later.
pub async fn insert_transfer(notice: &TransferNotice, conn: &mut SqliteConnection) -> Result<i64, PaymentGatewayError> {
    let row = sqlx::query(
        "INSERT INTO transfer_payments (txid, reference, memo, amount) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&notice.txid)
    .bind(&notice.reference)
    .bind(&notice.memo)
    .bind(notice.amount)
    .fetch_one(conn)
    .await?;
    let id: i64 = row.get(0);
    debug!("💸️ Transfer [{}] recorded with id {id}", notice.txid);
    Ok(id)
}

pub async fn link_order(transfer_id: i64, order_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE transfer_payments SET order_id = $1 WHERE id = $2")
        .bind(order_id)
        .bind(transfer_id)
        .execute(conn)
        .await?;
    Ok(())
}
