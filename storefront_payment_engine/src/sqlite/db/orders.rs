use chrono::Duration;
use log::{debug, trace};
use sqlx::{QueryBuilder, Row, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderItem, OrderNumber, OrderStatusType, OrderTotals, PaymentStatus},
    helpers::payment_reference_for,
    spe_api::order_objects::OrderQueryFilter,
    traits::PaymentGatewayError,
};

/// Inserts a new order and its line items using the given connection. This is not atomic on its own; callers embed
/// it inside a transaction and pass `&mut *tx` as the connection argument.
///
/// The order number is derived from the assigned row id (`ORD-000042`) and, for transfer-based payment methods,
/// the payment reference is derived from the order number. Both are written before the transaction commits, so an
/// order is never visible without them.
pub async fn insert_order(
    order: NewOrder,
    totals: OrderTotals,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let row = sqlx::query(
        r#"
            INSERT INTO orders (
                user_id,
                subtotal,
                shipping_fee,
                discount,
                total,
                name,
                phone,
                address,
                province,
                district,
                ward,
                note,
                payment_method
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id;
        "#,
    )
    .bind(order.user_id)
    .bind(totals.subtotal)
    .bind(totals.shipping_fee)
    .bind(totals.discount)
    .bind(totals.total)
    .bind(&order.shipping.name)
    .bind(&order.shipping.phone)
    .bind(&order.shipping.address)
    .bind(&order.shipping.province)
    .bind(&order.shipping.district)
    .bind(&order.shipping.ward)
    .bind(&order.shipping.note)
    .bind(order.payment_method)
    .fetch_one(&mut *conn)
    .await?;
    let id: i64 = row.get(0);

    for item in &order.items {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6);
        "#,
        )
        .bind(id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.unit_price * item.quantity)
        .execute(&mut *conn)
        .await?;
    }

    let order_number = OrderNumber::from(format!("ORD-{id:06}"));
    let payment_ref = order.payment_method.is_transfer().then(|| payment_reference_for(&order_number));
    let order: Order = sqlx::query_as("UPDATE orders SET order_number = $1, payment_ref = $2 WHERE id = $3 RETURNING *")
        .bind(order_number.as_str())
        .bind(payment_ref)
        .bind(id)
        .fetch_one(conn)
        .await?;
    debug!("📝️ Order [{}] inserted with id {}", order.order_number, order.id);
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Matches an order by its payment reference. References are compared case-insensitively since banks routinely
/// fold memo case.
pub async fn fetch_order_by_payment_ref(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE UPPER(payment_ref) = UPPER($1)")
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

fn push_filters(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, query: &OrderQueryFilter) {
    if !query.is_empty() {
        builder.push(" WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(payment_status) = query.payment_status {
        where_clause.push(format!("payment_status = '{payment_status}'"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at`, newest first, and paginated when the filter asks for a page.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_filters(&mut builder, &query);
    builder.push(" ORDER BY created_at DESC, id DESC");
    if let Some((limit, offset)) = query.limits() {
        builder.push(format!(" LIMIT {limit} OFFSET {offset}"));
    }
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

/// The number of orders the filter matches, ignoring pagination.
pub async fn count_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filters(&mut builder, &query);
    let count: i64 = builder.build().fetch_one(conn).await?.get(0);
    Ok(count)
}

/// Transitions the payment and fulfilment columns together. Used for `pending → paid` (confirming the order) and
/// `pending → failed` (cancelling it).
pub(crate) async fn set_payment_state(
    id: i64,
    payment_status: PaymentStatus,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_status = $1, status = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3 RETURNING *",
    )
    .bind(payment_status.to_string())
    .bind(status.to_string())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    result.ok_or(PaymentGatewayError::OrderIdNotFound(id))
}

/// Expires transfer-based orders that have been pending for longer than `window`. Expiry fails the payment and
/// cancels the order in one statement.
pub(crate) async fn expire_overdue(
    window: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, PaymentGatewayError> {
    let rows = sqlx::query_as(
        format!(
            "UPDATE orders SET payment_status = 'failed', status = 'cancelled', updated_at = CURRENT_TIMESTAMP \
             WHERE payment_method = 'sepay' AND payment_status = 'pending' AND \
             (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) > {} RETURNING *;",
            window.num_seconds()
        )
        .as_str(),
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
