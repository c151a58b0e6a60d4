use actix_web::{http::StatusCode, test, web, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use spg_common::{Money, Secret};
use storefront_payment_engine::db_types::{
    Order,
    OrderNumber,
    OrderStatusType,
    PaymentMethod,
    PaymentStatus,
    ShippingAddress,
    User,
};

use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
};

pub fn test_issuer() -> TokenIssuer {
    TokenIssuer::new(&AuthConfig { jwt_secret: Secret::new("0123456789abcdef0123456789abcdef".to_string()) })
}

pub fn test_user(id: i64) -> User {
    User {
        id,
        username: "alice".into(),
        email: "alice@x.com".into(),
        display_name: Some("Alice Doe".into()),
        is_active: true,
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
    }
}

pub fn issue_token(user_id: i64) -> String {
    test_issuer().issue_token(&test_user(user_id)).expect("Failed to issue test token")
}

pub fn sample_order(user_id: i64) -> Order {
    let ts = Utc.with_ymd_and_hms(2026, 3, 5, 13, 30, 0).unwrap();
    Order {
        id: 123,
        order_number: OrderNumber::from("ORD-000123".to_string()),
        user_id,
        subtotal: Money::from(220_000),
        shipping_fee: Money::from(30_000),
        discount: Money::from(0),
        total: Money::from(250_000),
        shipping: ShippingAddress {
            name: "Trần Thị B".into(),
            phone: "0912345678".into(),
            address: "12 Nguyễn Huệ".into(),
            province: "79".into(),
            district: "760".into(),
            ward: "26740".into(),
            note: None,
        },
        payment_method: PaymentMethod::Sepay,
        payment_status: PaymentStatus::Pending,
        status: OrderStatusType::Pending,
        payment_ref: Some("ORD000123".into()),
        tracking_code: None,
        created_at: ts,
        updated_at: ts,
    }
}

/// Drives a GET request against a test app configured by `configure`. Success responses come back as
/// `Ok((status, body))`, error responses as `Err((status, body))` so tests can assert on both halves.
pub async fn get_request<F>(token: &str, path: &str, configure: F) -> Result<(StatusCode, String), (StatusCode, String)>
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().app_data(web::Data::new(test_issuer())).configure(configure)).await;
    let mut req = test::TestRequest::get().uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8(test::read_body(res).await.to_vec()).expect("Response body was not UTF-8");
    if status.is_success() {
        Ok((status, body))
    } else {
        Err((status, body))
    }
}

/// POST counterpart of [`get_request`]. `headers` lets webhook tests attach signatures.
pub async fn post_request<F>(
    token: &str,
    path: &str,
    body: serde_json::Value,
    headers: &[(&str, String)],
    configure: F,
) -> Result<(StatusCode, String), (StatusCode, String)>
where
    F: FnOnce(&mut ServiceConfig),
{
    let app = test::init_service(App::new().app_data(web::Data::new(test_issuer())).configure(configure)).await;
    let mut req = test::TestRequest::post().uri(path).set_json(&body);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    for (name, value) in headers {
        req = req.insert_header((*name, value.as_str()));
    }
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8(test::read_body(res).await.to_vec()).expect("Response body was not UTF-8");
    if status.is_success() {
        Ok((status, body))
    } else {
        Err((status, body))
    }
}
