use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use storefront_payment_engine::{
    db_types::{AuthProviderLink, NewUser, User},
    AuthApi,
    VerifiedIdentity,
};

use super::{
    helpers::{post_request, test_user},
    mocks::{MockAuthManager, MockVerifier},
};
use crate::{
    auth::VerifierError,
    routes::google_login,
};

fn identity() -> VerifiedIdentity {
    VerifiedIdentity {
        provider: "google".into(),
        subject: "sub-123".into(),
        email: "alice@x.com".into(),
        name: Some("Alice Doe".into()),
    }
}

fn login_body() -> serde_json::Value {
    serde_json::json!({ "credential": "google-id-token" })
}

fn register_route(cfg: &mut ServiceConfig, verifier: MockVerifier, manager: MockAuthManager) {
    cfg.service(
        web::resource("/auth/google/login")
            .route(web::post().to(google_login::<MockAuthManager, MockVerifier>)),
    )
    .app_data(web::Data::new(AuthApi::new(manager)))
    .app_data(web::Data::new(verifier));
}

#[actix_web::test]
async fn first_login_creates_a_user_and_issues_a_token() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut verifier = MockVerifier::new();
        verifier.expect_verify().returning(|_| Ok(identity()));
        let mut manager = MockAuthManager::new();
        manager.expect_fetch_provider_link().returning(|_, _| Ok(None));
        manager.expect_fetch_user_by_email().returning(|_| Ok(None));
        manager.expect_username_exists().returning(|_| Ok(false));
        manager.expect_create_user().returning(|user: NewUser| {
            Ok(User {
                id: 42,
                username: user.username,
                email: user.email,
                display_name: user.display_name,
                is_active: true,
                created_at: Utc::now(),
            })
        });
        manager.expect_upsert_provider_link().returning(|_, _, _, _| Ok(()));
        register_route(cfg, verifier, manager);
    };
    let (status, body) = post_request("", "/auth/google/login", login_body(), &[], configure).await.expect("login");
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["user"]["username"], "alice");
    assert_eq!(response["user"]["email"], "alice@x.com");
    assert!(!response["token"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn a_rejected_credential_reads_as_generic_unauthorized() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut verifier = MockVerifier::new();
        verifier.expect_verify().returning(|_| Err(VerifierError::Rejected));
        // The account store must never be touched for a bad credential
        let manager = MockAuthManager::new();
        register_route(cfg, verifier, manager);
    };
    let (status, body) =
        post_request("", "/auth/google/login", login_body(), &[], configure).await.expect_err("Expected error");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // No verification detail leaks to the client
    assert_eq!(body, r#"{"error":"Authentication Error. Unauthorized"}"#);
}

#[actix_web::test]
async fn a_disabled_account_gets_a_dedicated_error() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut verifier = MockVerifier::new();
        verifier.expect_verify().returning(|_| Ok(identity()));
        let mut manager = MockAuthManager::new();
        manager.expect_fetch_provider_link().returning(|_, _| {
            Ok(Some(AuthProviderLink {
                id: 1,
                provider: "google".into(),
                subject: "sub-123".into(),
                value: "alice@x.com".into(),
                user_id: 42,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });
        manager.expect_fetch_user_by_id().returning(|_| {
            let mut user = test_user(42);
            user.is_active = false;
            Ok(Some(user))
        });
        register_route(cfg, verifier, manager);
    };
    let (status, body) =
        post_request("", "/auth/google/login", login_body(), &[], configure).await.expect_err("Expected error");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("disabled"));
}
