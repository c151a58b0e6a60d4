use std::env;

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use spg_common::{parse_boolean_flag, Money, Secret};

use crate::errors::ServerError;

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8470;
const DEFAULT_PAYMENT_WINDOW: Duration = Duration::minutes(15);
const DEFAULT_SHIPPING_FEE: i64 = 30_000;
const DEFAULT_FREE_SHIPPING_THRESHOLD: i64 = 500_000;
const DEFAULT_EXPIRY_CHECK_INTERVAL_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// The Google OAuth client id that incoming credentials must be issued for.
    pub google_client_id: String,
    /// Receiving bank account details, baked into the payment QR code.
    pub bank: BankConfig,
    /// How long payment instructions stay valid after checkout. Overdue orders are expired server-side.
    pub payment_window: Duration,
    /// Flat shipping fee for orders below the free-shipping threshold.
    pub shipping_fee: Money,
    pub free_shipping_threshold: Option<Money>,
    /// Shared secret for the bank-transfer webhook signature.
    pub webhook_secret: Secret<String>,
    /// When false, webhook signatures are not checked. Only ever disable this against a local dev provider.
    pub webhook_signature_checks: bool,
    /// Cadence of the payment-expiry sweep.
    pub expiry_check_interval: std::time::Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            google_client_id: String::default(),
            bank: BankConfig::default(),
            payment_window: DEFAULT_PAYMENT_WINDOW,
            shipping_fee: Money::from(DEFAULT_SHIPPING_FEE),
            free_shipping_threshold: Some(Money::from(DEFAULT_FREE_SHIPPING_THRESHOLD)),
            webhook_secret: Secret::default(),
            webhook_signature_checks: true,
            expiry_check_interval: std::time::Duration::from_secs(DEFAULT_EXPIRY_CHECK_INTERVAL_SECS),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_DATABASE_URL is not set. Please set it to the URL for the gateway database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to \
                 the default configuration."
            );
            AuthConfig::default()
        });
        let google_client_id = env::var("SPG_GOOGLE_CLIENT_ID").ok().unwrap_or_else(|| {
            error!(
                "🪛️ SPG_GOOGLE_CLIENT_ID is not set. Google sign-in will reject every credential until it is \
                 configured."
            );
            String::default()
        });
        let bank = BankConfig::from_env_or_defaults();
        let payment_window = env::var("SPG_PAYMENT_WINDOW_MINUTES")
            .map_err(|_| {
                info!(
                    "🪛️ SPG_PAYMENT_WINDOW_MINUTES is not set. Using the default value of {} minutes.",
                    DEFAULT_PAYMENT_WINDOW.num_minutes()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::minutes)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SPG_PAYMENT_WINDOW_MINUTES. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_PAYMENT_WINDOW);
        let shipping_fee = parse_money("SPG_SHIPPING_FEE").unwrap_or(Money::from(DEFAULT_SHIPPING_FEE));
        let free_shipping_threshold = match env::var("SPG_FREE_SHIPPING_THRESHOLD") {
            Ok(s) if ["none", "off", "0"].contains(&s.to_lowercase().as_str()) => None,
            _ => Some(
                parse_money("SPG_FREE_SHIPPING_THRESHOLD").unwrap_or(Money::from(DEFAULT_FREE_SHIPPING_THRESHOLD)),
            ),
        };
        let webhook_secret = env::var("SPG_WEBHOOK_SECRET").map(Secret::new).unwrap_or_else(|_| {
            error!(
                "🪛️ SPG_WEBHOOK_SECRET is not set. The bank-transfer webhook will reject every notification until \
                 it is configured."
            );
            Secret::default()
        });
        let webhook_signature_checks = parse_boolean_flag(env::var("SPG_WEBHOOK_SIGNATURE_CHECKS").ok(), true);
        if !webhook_signature_checks {
            warn!(
                "🚨️ Webhook signature checks are disabled. Anyone who can reach the webhook endpoint can mark \
                 orders as paid. Never run like this in production."
            );
        }
        let expiry_check_interval = env::var("SPG_EXPIRY_CHECK_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(std::time::Duration::from_secs)
            .unwrap_or(std::time::Duration::from_secs(DEFAULT_EXPIRY_CHECK_INTERVAL_SECS));
        Self {
            host,
            port,
            database_url,
            auth,
            google_client_id,
            bank,
            payment_window,
            shipping_fee,
            free_shipping_threshold,
            webhook_secret,
            webhook_signature_checks,
            expiry_check_interval,
        }
    }
}

fn parse_money(var: &str) -> Option<Money> {
    env::var(var).ok().and_then(|s| {
        s.parse::<i64>()
            .map(Money::from)
            .map_err(|e| warn!("🪛️ Invalid configuration value for {var}: {e}"))
            .ok()
    })
}

//-------------------------------------------------  BankConfig  ------------------------------------------------------
/// The account incoming transfers land on. These values are rendered into the payment QR code, so a
/// misconfiguration here means payments reference the wrong account.
#[derive(Clone, Debug, Default)]
pub struct BankConfig {
    /// Bank short code as used by the QR provider, e.g. `MB`, `VCB`.
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
}

impl BankConfig {
    pub fn from_env_or_defaults() -> Self {
        let bank_code = env::var("SPG_BANK_CODE").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_BANK_CODE is not set. Please set it to your receiving bank's short code.");
            String::default()
        });
        let account_number = env::var("SPG_BANK_ACCOUNT_NUMBER").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_BANK_ACCOUNT_NUMBER is not set. Payment QR codes will be unusable until it is set.");
            String::default()
        });
        let account_name = env::var("SPG_BANK_ACCOUNT_NAME").ok().unwrap_or_default();
        Self { bank_code, account_number, account_name }
    }
}

//-------------------------------------------------  AuthConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The secret used to sign session JWTs (HMAC-SHA256).
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this, since every session dies with the process. Set SPG_JWT_SECRET \
             instead. 🚨️🚨️🚨️"
        );
        let secret: String = rand::thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("SPG_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [SPG_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "SPG_JWT_SECRET must be at least 32 characters long.".to_string(),
            ));
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}
