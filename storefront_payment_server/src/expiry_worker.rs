use chrono::Duration;
use log::*;
use storefront_payment_engine::{
    db_types::Order,
    events::EventProducers,
    OrderFlowApi,
    PricingPolicy,
    SqliteDatabase,
};
use tokio::task::JoinHandle;

/// Starts the payment-expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The worker is the server-side backstop for abandoned checkouts: even if a client's countdown never reports
/// back, an unpaid transfer order is failed and cancelled once its payment window lapses.
pub fn start_expiry_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    payment_window: Duration,
    check_interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(check_interval);
        let api = OrderFlowApi::new(db, PricingPolicy::default(), producers);
        info!("🕰️ Payment expiry worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running payment expiry job");
            match api.expire_overdue_payments(payment_window).await {
                Ok(expired) if expired.is_empty() => {},
                Ok(expired) => {
                    info!("🕰️ {} overdue orders expired", expired.len());
                    debug!("🕰️ Expired orders: {}", order_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running payment expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] order_number: {} user: {}", o.id, o.order_number, o.user_id))
        .collect::<Vec<String>>()
        .join(", ")
}
