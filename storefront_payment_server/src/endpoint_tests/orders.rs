use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use storefront_payment_engine::{
    db_types::{NewOrder, OrderTotals},
    events::EventProducers,
    AccountApi,
    OrderFlowApi,
    PricingPolicy,
};

use super::{
    helpers::{get_request, issue_token, post_request, sample_order},
    mocks::{MockAccountManager, MockGateway},
};
use crate::{
    config::BankConfig,
    payment_info::PaymentInfoResolver,
    routes::{create_order, my_orders, order_detail, order_payment, order_status},
};

const STATUS_JSON: &str = r#"{"status":"pending","paymentStatus":"pending","paymentRef":"ORD000123"}"#;

fn configure_status(cfg: &mut ServiceConfig) {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_order_by_number().returning(|number| {
        if number.as_str() == "ORD-000123" {
            Ok(Some(sample_order(1)))
        } else {
            Ok(None)
        }
    });
    let accounts_api = AccountApi::new(account_manager);
    cfg.service(web::resource("/orders/{order_code}/status").route(web::get().to(order_status::<MockAccountManager>)))
        .app_data(web::Data::new(accounts_api));
}

#[actix_web::test]
async fn status_is_public_and_slim() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/orders/ORD-000123/status", configure_status).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, STATUS_JSON);
}

#[actix_web::test]
async fn status_for_unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("", "/orders/ORD-999999/status", configure_status).await.expect_err("Expected error");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn configure_payment(cfg: &mut ServiceConfig) {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_order_by_number().returning(|number| {
        match number.as_str() {
            // A fresh, pending transfer order
            "ORD-000123" => {
                let mut order = sample_order(1);
                order.created_at = Utc::now();
                Ok(Some(order))
            },
            // A settled one
            "ORD-000124" => {
                let mut order = sample_order(1);
                order.payment_status = storefront_payment_engine::db_types::PaymentStatus::Paid;
                Ok(Some(order))
            },
            _ => Ok(None),
        }
    });
    let accounts_api = AccountApi::new(account_manager);
    let bank = BankConfig { bank_code: "MB".into(), account_number: "0123456789".into(), account_name: "SHOP".into() };
    let resolver = PaymentInfoResolver::new(bank, Duration::minutes(15));
    cfg.service(web::resource("/orders/{order_code}/payment").route(web::get().to(order_payment::<MockAccountManager>)))
        .app_data(web::Data::new(accounts_api))
        .app_data(web::Data::new(resolver));
}

#[actix_web::test]
async fn payment_info_amount_equals_the_order_total() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/orders/ORD-000123/payment", configure_payment).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let info: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(info["amount"], 250_000);
    assert_eq!(info["paymentRef"], "ORD000123");
    assert!(info["qrUrl"].as_str().unwrap().contains("des=ORD000123"));
}

#[actix_web::test]
async fn payment_info_is_gone_once_settled() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/orders/ORD-000124/payment", configure_payment).await.expect_err("Expected error");
    assert_eq!(status, StatusCode::GONE);
    assert!(body.contains("already paid"));
}

fn configure_orders(cfg: &mut ServiceConfig) {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_count_orders().returning(|_| Ok(1));
    account_manager.expect_search_orders().returning(|query| {
        assert_eq!(query.user_id, Some(7), "the filter must be scoped to the caller");
        Ok(vec![sample_order(7)])
    });
    let accounts_api = AccountApi::new(account_manager);
    cfg.service(web::resource("/orders").route(web::get().to(my_orders::<MockAccountManager>)))
        .app_data(web::Data::new(accounts_api));
}

#[actix_web::test]
async fn fetch_my_orders_without_a_token_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/orders", configure_orders).await.expect_err("Expected error");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token was provided"));
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7);
    let (status, body) = get_request(&token, "/orders?page=1&limit=10", configure_orders).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let page: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["orders"][0]["orderNumber"], "ORD-000123");
    assert_eq!(page["orders"][0]["shippingAddress"]["phone"], "0912345678");
}

#[actix_web::test]
async fn fetch_my_orders_with_a_tampered_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut token = issue_token(7);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let (status, _) = get_request(&token, "/orders", configure_orders).await.expect_err("Expected error");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn configure_detail(cfg: &mut ServiceConfig) {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_order_by_id().returning(|id| {
        if id == 123 {
            Ok(Some(sample_order(8)))
        } else {
            Ok(None)
        }
    });
    account_manager.expect_fetch_order_items().returning(|_| Ok(vec![]));
    let accounts_api = AccountApi::new(account_manager);
    cfg.service(web::resource("/orders/{id}").route(web::get().to(order_detail::<MockAccountManager>)))
        .app_data(web::Data::new(accounts_api));
}

#[actix_web::test]
async fn another_users_order_detail_reads_as_not_found() {
    let _ = env_logger::try_init().ok();
    // The order exists but belongs to user 8; user 7 must not learn that
    let token = issue_token(7);
    let (status, _) = get_request(&token, "/orders/123", configure_detail).await.expect_err("Expected error");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn checkout_body() -> serde_json::Value {
    serde_json::json!({
        "items": [
            {"productId": 11, "productName": "Áo khoác", "quantity": 2, "unitPrice": 110000}
        ],
        "shippingAddress": {
            "name": "Trần Thị B",
            "phone": "0912345678",
            "address": "12 Nguyễn Huệ",
            "province": "79",
            "district": "760",
            "ward": "26740",
            "note": null
        },
        "paymentMethod": "sepay"
    })
}

fn configure_checkout(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway.expect_insert_order().returning(|order: NewOrder, totals: OrderTotals| {
        let mut stored = sample_order(order.user_id);
        stored.subtotal = totals.subtotal;
        stored.shipping_fee = totals.shipping_fee;
        stored.discount = totals.discount;
        stored.total = totals.total;
        Ok(stored)
    });
    let api = OrderFlowApi::new(gateway, PricingPolicy::default(), EventProducers::default());
    cfg.service(web::resource("/orders").route(web::post().to(create_order::<MockGateway>)))
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn checkout_recomputes_totals_server_side() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7);
    let (status, body) =
        post_request(&token, "/orders", checkout_body(), &[], configure_checkout).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["subtotal"], 220_000);
    assert_eq!(order["shippingFee"], 30_000);
    assert_eq!(order["total"], 250_000);
}

fn configure_checkout_never_stores(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway.expect_insert_order().never();
    let api = OrderFlowApi::new(gateway, PricingPolicy::default(), EventProducers::default());
    cfg.service(web::resource("/orders").route(web::post().to(create_order::<MockGateway>)))
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn an_empty_cart_is_rejected_before_the_database() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7);
    let mut body = checkout_body();
    body["items"] = serde_json::json!([]);
    let (status, message) =
        post_request(&token, "/orders", body, &[], configure_checkout_never_stores).await.expect_err("Expected error");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message.contains("cart is empty"));
}
