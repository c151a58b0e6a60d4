use actix_web::{http::StatusCode, web, web::ServiceConfig};
use spg_common::{Money, Secret};
use storefront_payment_engine::{
    db_types::TransferNotice,
    events::EventProducers,
    traits::TransferOutcome,
    OrderFlowApi,
    PricingPolicy,
};

use super::{
    helpers::{post_request, sample_order},
    mocks::MockGateway,
};
use crate::{
    routes::{bank_transfer_webhook, WEBHOOK_SIGNATURE_HEADER},
    webhook::{sign_body, WebhookOptions},
};

fn secret() -> Secret<String> {
    Secret::new("webhook-secret".to_string())
}

fn notification() -> serde_json::Value {
    serde_json::json!({
        "txid": "FT2400123",
        "reference": "ORD000123",
        "memo": null,
        "amount": 250000
    })
}

fn configure(cfg: &mut ServiceConfig) {
    let mut gateway = MockGateway::new();
    gateway.expect_apply_transfer().returning(|notice: TransferNotice| {
        assert_eq!(notice.amount, Money::from(250_000));
        let mut order = sample_order(1);
        order.payment_status = storefront_payment_engine::db_types::PaymentStatus::Paid;
        Ok(TransferOutcome::Paid(order))
    });
    let api = OrderFlowApi::new(gateway, PricingPolicy::default(), EventProducers::default());
    cfg.service(web::resource("/webhooks/bank-transfer").route(web::post().to(bank_transfer_webhook::<MockGateway>)))
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(WebhookOptions { secret: secret(), signature_checks: true }));
}

#[actix_web::test]
async fn a_signed_notification_is_processed() {
    let _ = env_logger::try_init().ok();
    let body = notification();
    let raw = serde_json::to_vec(&body).unwrap();
    let signature = sign_body(&secret(), &raw);
    let (status, response) = post_request(
        "",
        "/webhooks/bank-transfer",
        body,
        &[(WEBHOOK_SIGNATURE_HEADER, signature)],
        configure,
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains(r#""success":true"#));
}

#[actix_web::test]
async fn an_unsigned_notification_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request("", "/webhooks/bank-transfer", notification(), &[], configure).await.expect_err("Expected error");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn a_badly_signed_notification_is_rejected() {
    let _ = env_logger::try_init().ok();
    let signature = sign_body(&Secret::new("wrong-secret".into()), b"unrelated");
    let (status, _) = post_request(
        "",
        "/webhooks/bank-transfer",
        notification(),
        &[(WEBHOOK_SIGNATURE_HEADER, signature)],
        configure,
    )
    .await
    .expect_err("Expected error");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
