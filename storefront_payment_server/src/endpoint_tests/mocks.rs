use chrono::Duration;
use mockall::mock;
use storefront_payment_engine::{
    db_types::{
        AuthProviderLink,
        NewOrder,
        NewUser,
        Order,
        OrderItem,
        OrderNumber,
        OrderTotals,
        PaymentStatus,
        TrackingEvent,
        TransferNotice,
        User,
    },
    order_objects::OrderQueryFilter,
    traits::{
        AccountApiError,
        AccountManagement,
        AuthApiError,
        AuthManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        TransferOutcome,
    },
    VerifiedIdentity,
};

use crate::auth::{IdTokenVerifier, VerifierError};

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, AccountApiError>;
        async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, AccountApiError>;
        async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, AccountApiError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError>;
        async fn count_orders(&self, query: OrderQueryFilter) -> Result<i64, AccountApiError>;
        async fn fetch_tracking_events(&self, order_id: i64) -> Result<Vec<TrackingEvent>, AccountApiError>;
    }
}

mock! {
    pub AuthManager {}
    impl AuthManagement for AuthManager {
        async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, AuthApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;
        async fn username_exists(&self, username: &str) -> Result<bool, AuthApiError>;
        async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;
        async fn fetch_provider_link(&self, provider: &str, subject: &str) -> Result<Option<AuthProviderLink>, AuthApiError>;
        async fn upsert_provider_link(&self, provider: &str, subject: &str, value: &str, user_id: i64) -> Result<(), AuthApiError>;
    }
}

mock! {
    pub Verifier {}
    impl IdTokenVerifier for Verifier {
        async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, VerifierError>;
    }
}

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl AccountManagement for Gateway {
        async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, AccountApiError>;
        async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, AccountApiError>;
        async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, AccountApiError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError>;
        async fn count_orders(&self, query: OrderQueryFilter) -> Result<i64, AccountApiError>;
        async fn fetch_tracking_events(&self, order_id: i64) -> Result<Vec<TrackingEvent>, AccountApiError>;
    }
    impl PaymentGatewayDatabase for Gateway {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder, totals: OrderTotals) -> Result<Order, PaymentGatewayError>;
        async fn apply_transfer(&self, notice: TransferNotice) -> Result<TransferOutcome, PaymentGatewayError>;
        async fn update_payment_status(&self, order_number: &OrderNumber, status: PaymentStatus) -> Result<Order, PaymentGatewayError>;
        async fn expire_overdue_orders(&self, window: Duration) -> Result<Vec<Order>, PaymentGatewayError>;
    }
}
