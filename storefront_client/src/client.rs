use anyhow::{anyhow, Result};
use log::info;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Response,
};
use serde::de::DeserializeOwned;
use storefront_payment_engine::{
    db_types::Order,
    order_objects::{FullOrder, OrderList, OrderStatusSummary, TrackingReport},
    payment_objects::PaymentInfo,
};
use storefront_payment_server::data_objects::{CheckoutRequest, GoogleLoginRequest, LoginResponse};
use url::Url;

use crate::{
    checkout::validate_form,
    poller::{PollStatus, StatusSource},
};

/// Typed client for the storefront payment gateway's REST surface.
#[derive(Clone)]
pub struct StorefrontClient {
    client: Client,
    base: Url,
    access_token: String,
}

impl StorefrontClient {
    pub fn new(base: Url) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent("Storefront Gateway Client")
            .default_headers(headers)
            .build()
            .expect("Failed to create reqwest client");
        StorefrontClient { client, base, access_token: "".to_string() }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.access_token = token;
        self
    }

    pub fn server(&self) -> &str {
        self.base.as_str()
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| anyhow!("Failed to join URL: {}", e))
    }

    pub async fn health(&self) -> Result<String> {
        let url = self.url("/health")?;
        let res = self.client.get(url).send().await?;
        let response = res.text().await?;
        Ok(response)
    }

    /// Exchanges a Google credential for a session token, which is stored for subsequent calls.
    pub async fn login_with_google(&mut self, credential: &str) -> Result<LoginResponse> {
        let url = self.url("/auth/google/login")?;
        let body = GoogleLoginRequest { credential: credential.to_string() };
        let res = self.client.post(url).json(&body).send().await?;
        let login: LoginResponse = read_json(res).await?;
        info!("Logged in as {} ({})", login.user.username, login.user.email);
        self.access_token = login.token.clone();
        Ok(login)
    }

    /// Submits the checkout form. The form is validated locally first; a validation failure means no request is
    /// issued at all.
    pub async fn checkout(&self, request: &CheckoutRequest) -> Result<Order> {
        validate_form(request)?;
        let url = self.url("/orders")?;
        let res = self.client.post(url).bearer_auth(&self.access_token).json(request).send().await?;
        read_json(res).await
    }

    /// Payment instructions for a transfer-based order. 410 responses mean the instructions no longer exist
    /// (settled or expired).
    pub async fn payment_info(&self, order_number: &str) -> Result<PaymentInfo> {
        let url = self.url(&format!("/orders/{order_number}/payment"))?;
        let res = self.client.get(url).send().await?;
        read_json(res).await
    }

    pub async fn order_status(&self, order_number: &str) -> Result<OrderStatusSummary> {
        let url = self.url(&format!("/orders/{order_number}/status"))?;
        let res = self.client.get(url).send().await?;
        read_json(res).await
    }

    pub async fn my_orders(&self, page: i64, limit: i64) -> Result<OrderList> {
        let url = self.url(&format!("/orders?page={page}&limit={limit}"))?;
        let res = self.client.get(url).bearer_auth(&self.access_token).send().await?;
        read_json(res).await
    }

    pub async fn order_detail(&self, id: i64) -> Result<FullOrder> {
        let url = self.url(&format!("/orders/{id}"))?;
        let res = self.client.get(url).bearer_auth(&self.access_token).send().await?;
        read_json(res).await
    }

    pub async fn tracking(&self, id: i64) -> Result<TrackingReport> {
        let url = self.url(&format!("/orders/{id}/tracking"))?;
        let res = self.client.get(url).bearer_auth(&self.access_token).send().await?;
        read_json(res).await
    }
}

impl StatusSource for StorefrontClient {
    /// The poller's view of the status endpoint: raw strings, no enum parsing, so an unfamiliar status value can
    /// never kill the polling loop.
    async fn fetch_status(&self, order_number: &str) -> Result<PollStatus> {
        let url = self.url(&format!("/orders/{order_number}/status"))?;
        let res = self.client.get(url).send().await?;
        let status = res.error_for_status()?.json::<PollStatus>().await?;
        Ok(status)
    }
}

/// Parses a success body, or surfaces the server's error message verbatim.
async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T> {
    if res.status().is_success() {
        Ok(res.json::<T>().await?)
    } else {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or(body);
        Err(anyhow!("{status}: {message}"))
    }
}
