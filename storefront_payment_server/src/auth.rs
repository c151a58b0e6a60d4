use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::Duration;
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
};
use log::debug;
use serde::{Deserialize, Serialize};
use storefront_payment_engine::{db_types::User, VerifiedIdentity};

use crate::{config::AuthConfig, errors::{AuthError, ServerError}};

/// Session tokens are issued with a fixed lifetime and are never refreshed; users sign in again when one lapses.
const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user's internal id.
    pub sub: i64,
    pub email: String,
    pub username: String,
}

impl From<&User> for JwtClaims {
    fn from(user: &User) -> Self {
        Self { sub: user.id, email: user.email.clone(), username: user.username.clone() }
    }
}

/// Issues and validates HS256 session tokens.
pub struct TokenIssuer {
    key: Hs256Key,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key }
    }

    /// Issue a new access token for the given user.
    /// This method DOES NOT verify that the user is allowed to log in. This must be done prior to calling
    /// `issue_token`.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let header = Header::empty().with_token_type("JWT");
        let claims = Claims::new(JwtClaims::from(user))
            .set_duration_and_issuance(&TimeOptions::default(), Duration::hours(TOKEN_LIFETIME_HOURS));
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::ValidationError(format!("{e:?}")))
    }

    /// Validates a bearer token's signature and expiry, returning its claims.
    pub fn decode_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted_token =
            UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(format!("{e:?}")))?;
        let token: jwt_compact::Token<JwtClaims> = Hs256
            .validator(&self.key)
            .validate(&untrusted_token)
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        token
            .claims()
            .validate_expiration(&TimeOptions::default())
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        Ok(token.claims().custom.clone())
    }
}

/// Extracts and validates the session claims from the `Authorization: Bearer` header.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::Unspecified("TokenIssuer is not configured".to_string()))?;
    let value = req.headers().get(header::AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        AuthError::PoorlyFormattedToken("The Authorization header must carry a bearer token".to_string())
    })?;
    let claims = issuer.decode_token(token).map_err(|e| {
        debug!("🔐️ Rejecting access token. {e}");
        e
    })?;
    Ok(claims)
}

//---------------------------------------    Credential verification   ------------------------------------------------

#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifierError {
    /// The provider rejected the credential, or its claims did not check out. Reported to clients as a generic
    /// unauthorized error.
    #[error("The identity credential was rejected")]
    Rejected,
    #[error("Could not reach the identity provider: {0}")]
    Network(String),
}

/// The seam between the login route and the identity provider. Production uses [`GoogleTokenVerifier`]; tests
/// substitute a mock.
#[allow(async_fn_in_trait)]
pub trait IdTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, VerifierError>;
}

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Verifies Google ID tokens against the tokeninfo endpoint, which checks the signature and expiry on Google's
/// side. The audience still has to be checked here, against the configured client id.
#[derive(Clone)]
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    iss: String,
    sub: String,
    email: String,
    email_verified: Option<String>,
    name: Option<String>,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Storefront Payment Server")
            .build()
            .expect("Failed to create reqwest client");
        Self { client, client_id }
    }
}

impl IdTokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, VerifierError> {
        let res = self
            .client
            .get(GOOGLE_TOKENINFO_URL)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| VerifierError::Network(e.to_string()))?;
        if !res.status().is_success() {
            debug!("🔐️ Google rejected the credential with status {}", res.status());
            return Err(VerifierError::Rejected);
        }
        let info: GoogleTokenInfo = res.json().await.map_err(|e| VerifierError::Network(e.to_string()))?;
        if info.aud != self.client_id {
            debug!("🔐️ Credential audience mismatch: {}", info.aud);
            return Err(VerifierError::Rejected);
        }
        if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
            debug!("🔐️ Credential issuer mismatch: {}", info.iss);
            return Err(VerifierError::Rejected);
        }
        if info.email_verified.as_deref() != Some("true") {
            debug!("🔐️ Credential email is not verified");
            return Err(VerifierError::Rejected);
        }
        Ok(VerifiedIdentity { provider: "google".to_string(), subject: info.sub, email: info.email, name: info.name })
    }
}
