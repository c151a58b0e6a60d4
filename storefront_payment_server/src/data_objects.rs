use std::fmt::Display;

use serde::{Deserialize, Serialize};
use storefront_payment_engine::db_types::{
    NewOrder,
    NewOrderItem,
    OrderStatusType,
    PaymentMethod,
    PaymentStatus,
    ShippingAddress,
    User,
};

/// The checkout submission body. Only structure comes from the client; every amount is recomputed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

impl CheckoutRequest {
    /// Attaches the authenticated user. The claims are the only source of the order's owner.
    pub fn into_new_order(self, user_id: i64) -> NewOrder {
        NewOrder { user_id, payment_method: self.payment_method, shipping: self.shipping_address, items: self.items }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleLoginRequest {
    pub credential: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Query parameters of the order-list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<OrderStatusType>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
