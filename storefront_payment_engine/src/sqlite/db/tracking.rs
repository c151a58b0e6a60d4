use sqlx::SqliteConnection;

use crate::db_types::TrackingEvent;

/// The carrier timeline for an order, oldest hop first.
pub async fn fetch_events(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<TrackingEvent>, sqlx::Error> {
    let events = sqlx::query_as("SELECT * FROM tracking_events WHERE order_id = $1 ORDER BY time ASC, id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(events)
}

/// Appends a hop to the timeline. Fed by the carrier integration; the storefront API only ever reads.
pub async fn insert_event(
    order_id: i64,
    status: &str,
    description: &str,
    station: &str,
    next_station: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO tracking_events (order_id, status, description, station, next_station) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(order_id)
    .bind(status)
    .bind(description)
    .bind(station)
    .bind(next_station)
    .execute(conn)
    .await?;
    Ok(())
}
