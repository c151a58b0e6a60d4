//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the backend traits, so endpoint tests can substitute mocks; the concrete
//! `SqliteDatabase` is wired in at registration time in [`crate::server`].
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use storefront_payment_engine::{
    db_types::{OrderNumber, TransferNotice},
    order_objects::{OrderQueryFilter, DEFAULT_PAGE_SIZE},
    traits::{AccountManagement, AuthManagement, PaymentGatewayDatabase, TransferOutcome},
    AccountApi,
    AuthApi,
    OrderFlowApi,
};

use crate::{
    auth::{IdTokenVerifier, JwtClaims, TokenIssuer},
    data_objects::{CheckoutRequest, GoogleLoginRequest, JsonResponse, LoginResponse, OrderPageQuery},
    errors::{AuthError, ServerError},
    payment_info::{PaymentInfoDenied, PaymentInfoResolver},
    webhook::{signature_is_valid, WebhookOptions},
};

pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-webhook-signature";

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
/// Route handler for the Google login endpoint.
///
/// The third-party credential is verified against the configured client id; a verified identity is then resolved
/// to a local user account (created on first login, with a derived-unique username). On success a session token
/// with a fixed 24-hour expiry is issued alongside the user record.
///
/// Any verification failure is reported as a generic unauthorized error without detail; a disabled account gets
/// its own, dedicated error.
pub async fn google_login<A, V>(
    body: web::Json<GoogleLoginRequest>,
    api: web::Data<AuthApi<A>>,
    verifier: web::Data<V>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where
    A: AuthManagement,
    V: IdTokenVerifier,
{
    trace!("💻️ Received Google login request");
    let identity = verifier.verify(&body.credential).await.map_err(|e| {
        debug!("💻️ Credential verification failed. {e}");
        ServerError::AuthenticationError(AuthError::CredentialRejected)
    })?;
    let user = api.login_with_provider(identity).await?;
    let token = signer.issue_token(&user)?;
    debug!("💻️ Issued access token for user #{}", user.id);
    Ok(HttpResponse::Ok().json(LoginResponse { token, user }))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
/// Route handler for checkout submission.
///
/// Collects the cart items, shipping address and payment method as one request that atomically creates an order.
/// All totals are computed server-side. On failure the backend's error message is surfaced verbatim; the client
/// performs no retry.
pub async fn create_order<B: PaymentGatewayDatabase>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST checkout for user #{}", claims.sub);
    let new_order = body.into_inner().into_new_order(claims.sub);
    let order = api.process_checkout(new_order).await.map_err(|e| {
        debug!("💻️ Checkout failed. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payment  ----------------------------------------------------
/// Route handler for the payment-instructions endpoint.
///
/// Unauthenticated: knowing the order number is the capability, which is what the storefront checkout page holds.
/// Responds 404 for unknown orders and non-transfer methods, and 410 once the payment has settled or the window
/// has lapsed — the instructions have no existence beyond a pending payment.
pub async fn order_payment<B: AccountManagement>(
    path: web::Path<OrderNumber>,
    api: web::Data<AccountApi<B>>,
    resolver: web::Data<PaymentInfoResolver>,
) -> Result<HttpResponse, ServerError> {
    let order_number = path.into_inner();
    debug!("💻️ GET payment info for [{order_number}]");
    let order = api
        .order_by_number(&order_number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_number}")))?;
    match resolver.resolve(&order, Utc::now()) {
        Ok(info) => Ok(HttpResponse::Ok().json(info)),
        Err(PaymentInfoDenied::NotTransfer) => {
            Err(ServerError::NoRecordFound(format!("Order {order_number} has no transfer instructions")))
        },
        Err(PaymentInfoDenied::Settled(status)) => {
            Err(ServerError::PaymentInfoUnavailable(format!("The payment is already {status}")))
        },
        Err(PaymentInfoDenied::Expired) => {
            Err(ServerError::PaymentInfoUnavailable("The payment window has expired".to_string()))
        },
    }
}

/// Route handler for the status endpoint the checkout page polls.
///
/// Unauthenticated, like the payment endpoint. Returns `{status, paymentStatus, paymentRef?}`.
pub async fn order_status<B: AccountManagement>(
    path: web::Path<OrderNumber>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = path.into_inner();
    trace!("💻️ GET status for [{order_number}]");
    let summary = api
        .status_summary(&order_number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_number}")))?;
    Ok(HttpResponse::Ok().json(summary))
}

//----------------------------------------------   Orders  ----------------------------------------------------
/// Route handler for the order-list endpoint.
///
/// Authenticated users fetch their own orders, paginated, optionally filtered by status and payment status. The
/// owner comes from the JWT claims; there is no way to list another user's orders.
pub async fn my_orders<B: AccountManagement>(
    claims: JwtClaims,
    query: web::Query<OrderPageQuery>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    debug!("💻️ GET orders for user #{}", claims.sub);
    let mut filter =
        OrderQueryFilter::for_user(claims.sub).with_page(query.page.unwrap_or(1), query.limit.unwrap_or(DEFAULT_PAGE_SIZE));
    if let Some(status) = query.status {
        filter = filter.with_status(status);
    }
    if let Some(payment_status) = query.payment_status {
        filter = filter.with_payment_status(payment_status);
    }
    let orders = api.search_orders(filter).await.map_err(|e| {
        debug!("💻️ Could not fetch orders. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

/// Route handler for the order-detail endpoint.
///
/// Authenticated users can fetch their own orders by internal id. Any other id returns 404, whether it exists
/// or not.
pub async fn order_detail<B: AccountManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET order_detail({id}) for user #{}", claims.sub);
    let detail = api.order_detail(id).await.map_err(|e| {
        debug!("💻️ Could not fetch order. {e}");
        ServerError::from(e)
    })?;
    match detail {
        Some(detail) if detail.order.user_id == claims.sub => Ok(HttpResponse::Ok().json(detail)),
        _ => Err(ServerError::NoRecordFound(format!("Order #{id}"))),
    }
}

/// Route handler for the carrier-tracking endpoint.
///
/// Same ownership rule as the detail endpoint. 404 when no tracking data has arrived yet.
pub async fn order_tracking<B: AccountManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET tracking for order #{id}");
    let order = api.order_by_id(id).await?;
    match order {
        Some(order) if order.user_id == claims.sub => {},
        _ => return Err(ServerError::NoRecordFound(format!("Order #{id}"))),
    }
    let report = api
        .tracking_report(id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No tracking data for order #{id}")))?;
    Ok(HttpResponse::Ok().json(report))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
/// Route handler for incoming bank-transfer notifications.
///
/// The provider signs the raw body with the shared secret (base64 HMAC-SHA256 in the `x-webhook-signature`
/// header); the body is only parsed after the signature checks out. Processing is idempotent per bank txid, so
/// provider retries are harmless.
pub async fn bank_transfer_webhook<B: PaymentGatewayDatabase>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B>>,
    options: web::Data<WebhookOptions>,
) -> Result<HttpResponse, ServerError> {
    if options.signature_checks {
        let signature = req
            .headers()
            .get(WEBHOOK_SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ServerError::AuthenticationError(AuthError::MissingToken))?;
        if !signature_is_valid(&options.secret, &body, signature) {
            warn!("💻️ Rejecting bank-transfer notification with a bad signature");
            return Err(AuthError::ValidationError("Webhook signature mismatch".to_string()).into());
        }
    } else {
        debug!("💻️ Webhook signature checks are disabled; accepting the notification as-is");
    }
    let notice: TransferNotice =
        serde_json::from_slice(&body).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    info!("💻️ Bank transfer notification [{}] for {}", notice.txid, notice.amount);
    let outcome = api.process_transfer_notification(notice).await.map_err(|e| {
        debug!("💻️ Could not process transfer notification. {e}");
        e
    })?;
    let response = match outcome {
        TransferOutcome::Paid(order) => JsonResponse::success(format!("Order {} paid", order.order_number)),
        TransferOutcome::Duplicate { txid, .. } => JsonResponse::success(format!("Transfer {txid} already processed")),
        TransferOutcome::Unmatched { reason } => JsonResponse::failure(reason),
    };
    Ok(HttpResponse::Ok().json(response))
}
