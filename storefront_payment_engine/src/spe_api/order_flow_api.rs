use std::fmt::Debug;

use chrono::Duration;
use log::*;
use spg_common::Money;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderTotals, PaymentStatus, TransferNotice},
    events::{EventProducers, OrderAnnulledEvent, OrderCreatedEvent, OrderPaidEvent},
    traits::{PaymentGatewayDatabase, PaymentGatewayError, TransferOutcome},
};

/// The checkout pricing rules. Totals are always computed here, server-side; amounts submitted by a client are
/// never trusted.
#[derive(Debug, Clone, Copy)]
pub struct PricingPolicy {
    /// Flat shipping fee applied to every order below the free-shipping threshold.
    pub shipping_flat: Money,
    /// Orders with a subtotal at or above this ship for free.
    pub free_shipping_threshold: Option<Money>,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { shipping_flat: Money::from(30_000), free_shipping_threshold: Some(Money::from(500_000)) }
    }
}

impl PricingPolicy {
    /// Prices a checkout submission: `total = subtotal - discount + shipping_fee`.
    pub fn price(&self, order: &NewOrder) -> OrderTotals {
        let subtotal: Money = order.items.iter().map(|i| i.unit_price * i.quantity).sum();
        let shipping_fee = match self.free_shipping_threshold {
            Some(threshold) if subtotal >= threshold => Money::from(0),
            _ => self.shipping_flat,
        };
        // Vouchers and promotions are applied upstream of the gateway; the gateway itself never discounts.
        let discount = Money::from(0);
        let total = subtotal - discount + shipping_fee;
        OrderTotals { subtotal, shipping_fee, discount, total }
    }
}

/// `OrderFlowApi` is the primary API for handling the checkout and payment flows in response to storefront
/// checkout submissions and bank transfer events.
pub struct OrderFlowApi<B> {
    db: B,
    pricing: PricingPolicy,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, pricing: PricingPolicy, producers: EventProducers) -> Self {
        Self { db, pricing, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Submit a checkout to the order manager.
    ///
    /// The submission is validated (non-empty cart, sane quantities, non-blank address fields), priced by the
    /// [`PricingPolicy`], and stored atomically. The order number and, for transfer-based methods, the payment
    /// reference are assigned inside the same transaction.
    ///
    /// Returns the created order. An `OrderCreatedEvent` is fired on success.
    pub async fn process_checkout(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        validate_checkout(&order)?;
        let totals = self.pricing.price(&order);
        let order = self.db.insert_order(order, totals).await?;
        debug!("🔄️📦️ Order [{}] created for user #{} with total {}", order.order_number, order.user_id, order.total);
        self.call_order_created_hook(&order).await;
        Ok(order)
    }

    /// Submit an incoming transfer notification to the order manager.
    ///
    /// Processing is idempotent per bank transaction id. If the transfer settles an order, an `OrderPaidEvent` is
    /// fired and the paid order is returned in the outcome.
    pub async fn process_transfer_notification(
        &self,
        notice: TransferNotice,
    ) -> Result<TransferOutcome, PaymentGatewayError> {
        let txid = notice.txid.clone();
        let outcome = self.db.apply_transfer(notice).await?;
        match &outcome {
            TransferOutcome::Paid(order) => {
                debug!("🔄️💰️ Transfer [{txid}] paid order [{}] in full", order.order_number);
                self.call_order_paid_hook(order).await;
            },
            TransferOutcome::Duplicate { txid, .. } => {
                debug!("🔄️💰️ Transfer [{txid}] was a replay; no action taken");
            },
            TransferOutcome::Unmatched { reason } => {
                warn!("🔄️💰️ Transfer [{txid}] recorded but not matched: {reason}");
            },
        }
        Ok(outcome)
    }

    /// Fails a pending payment and cancels its order without waiting for the window to lapse. This is the
    /// support/ops action for a settlement the provider reported as rejected. An `OrderAnnulledEvent` is fired.
    pub async fn fail_payment(&self, order_number: &OrderNumber) -> Result<Order, PaymentGatewayError> {
        let order = self.db.update_payment_status(order_number, PaymentStatus::Failed).await?;
        info!("🔄️🚫️ Payment for order [{}] marked as failed", order.order_number);
        self.call_order_annulled_hook(&order).await;
        Ok(order)
    }

    /// Marks the orders whose payment window has lapsed as failed and cancels them. An `OrderAnnulledEvent` fires
    /// for each expired order.
    ///
    /// Typical values for `window` are 15 minutes for QR bank transfers.
    pub async fn expire_overdue_payments(&self, window: Duration) -> Result<Vec<Order>, PaymentGatewayError> {
        let expired = self.db.expire_overdue_orders(window).await?;
        for order in &expired {
            self.call_order_annulled_hook(order).await;
        }
        Ok(expired)
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producer {
            let event = OrderCreatedEvent { order: order.clone() };
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            trace!("🔄️💰️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent { order: order.clone() };
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            let event = OrderAnnulledEvent { order: order.clone(), status: order.status };
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// Fast-fail checkout validation. The same rules run client-side before any request is made; the server remains
/// the authority.
fn validate_checkout(order: &NewOrder) -> Result<(), PaymentGatewayError> {
    if order.items.is_empty() {
        return Err(PaymentGatewayError::InvalidOrder("The cart is empty".into()));
    }
    if let Some(item) = order.items.iter().find(|i| i.quantity < 1) {
        return Err(PaymentGatewayError::InvalidOrder(format!(
            "Invalid quantity {} for product {}",
            item.quantity, item.product_id
        )));
    }
    if let Some(item) = order.items.iter().find(|i| i.unit_price < Money::from(0)) {
        return Err(PaymentGatewayError::InvalidOrder(format!("Negative price for product {}", item.product_id)));
    }
    let addr = &order.shipping;
    let required = [
        ("name", addr.name.as_str()),
        ("phone", addr.phone.as_str()),
        ("address", addr.address.as_str()),
        ("province", addr.province.as_str()),
        ("district", addr.district.as_str()),
        ("ward", addr.ward.as_str()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(PaymentGatewayError::InvalidOrder(format!("Shipping address field '{field}' must not be blank")));
    }
    Ok(())
}
