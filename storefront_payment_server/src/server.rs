use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use storefront_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    AccountApi,
    AuthApi,
    OrderFlowApi,
    PricingPolicy,
    SqliteDatabase,
};

use crate::{
    auth::{GoogleTokenVerifier, TokenIssuer},
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    payment_info::PaymentInfoResolver,
    routes::{
        bank_transfer_webhook,
        create_order,
        google_login,
        health,
        my_orders,
        order_detail,
        order_payment,
        order_status,
        order_tracking,
    },
    webhook::WebhookOptions,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        Box::pin(async move {
            info!("💰️ Order [{}] has been paid in full", ev.order.order_number);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_order_annulled(|ev| {
        Box::pin(async move {
            info!("🚫️ Order [{}] was annulled ({})", ev.order.order_number, ev.status);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(16, hooks);
    let producers = handlers.producers();
    handlers.start_handlers();

    // Runs for the lifetime of the process; do not await the handle.
    let _expiry_worker =
        start_expiry_worker(db.clone(), producers.clone(), config.payment_window, config.expiry_check_interval);

    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let pricing = PricingPolicy {
            shipping_flat: config.shipping_fee,
            free_shipping_threshold: config.free_shipping_threshold,
        };
        let orders_api = OrderFlowApi::new(db.clone(), pricing, producers.clone());
        let accounts_api = AccountApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let verifier = GoogleTokenVerifier::new(config.google_client_id.clone());
        let resolver = PaymentInfoResolver::new(config.bank.clone(), config.payment_window);
        let webhook_options = WebhookOptions {
            secret: config.webhook_secret.clone(),
            signature_checks: config.webhook_signature_checks,
        };
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(verifier))
            .app_data(web::Data::new(resolver))
            .app_data(web::Data::new(webhook_options))
            .service(health)
            .service(
                web::resource("/auth/google/login")
                    .route(web::post().to(google_login::<SqliteDatabase, GoogleTokenVerifier>)),
            )
            .service(
                web::resource("/orders")
                    .route(web::post().to(create_order::<SqliteDatabase>))
                    .route(web::get().to(my_orders::<SqliteDatabase>)),
            )
            .service(
                web::resource("/orders/{order_code}/payment")
                    .route(web::get().to(order_payment::<SqliteDatabase>)),
            )
            .service(
                web::resource("/orders/{order_code}/status").route(web::get().to(order_status::<SqliteDatabase>)),
            )
            .service(web::resource("/orders/{id}/tracking").route(web::get().to(order_tracking::<SqliteDatabase>)))
            .service(web::resource("/orders/{id}").route(web::get().to(order_detail::<SqliteDatabase>)))
            .service(
                web::resource("/webhooks/bank-transfer")
                    .route(web::post().to(bank_transfer_webhook::<SqliteDatabase>)),
            )
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
