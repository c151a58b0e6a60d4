use hmac::{Hmac, Mac};
use sha2::Sha256;
use spg_common::Secret;

type HmacSha256 = Hmac<Sha256>;

/// Options for the bank-transfer webhook, injected as app data.
#[derive(Clone)]
pub struct WebhookOptions {
    pub secret: Secret<String>,
    /// Disabled only against local dev providers that cannot sign their calls.
    pub signature_checks: bool,
}

/// Checks the webhook signature: base64 of HMAC-SHA256 over the raw request body, keyed with the shared secret.
/// Comparison happens in constant time via the `Mac` verifier.
pub fn signature_is_valid(secret: &Secret<String>, body: &[u8], signature: &str) -> bool {
    if secret.reveal().is_empty() {
        // No secret configured means the webhook is effectively disabled
        return false;
    }
    let Ok(provided) = base64::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.reveal().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

/// Computes the signature header value for a body. Used by tests and by the client tooling when replaying
/// notifications against a dev server.
pub fn sign_body(secret: &Secret<String>, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.reveal().as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    base64::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn valid_signatures_verify() {
        let secret = Secret::new("webhook-secret".to_string());
        let body = br#"{"txid":"FT1","amount":250000}"#;
        let signature = sign_body(&secret, body);
        assert!(signature_is_valid(&secret, body, &signature));
    }

    #[test]
    fn tampered_bodies_fail() {
        let secret = Secret::new("webhook-secret".to_string());
        let signature = sign_body(&secret, b"original");
        assert!(!signature_is_valid(&secret, b"tampered", &signature));
    }

    #[test]
    fn an_unset_secret_rejects_everything() {
        let secret = Secret::<String>::default();
        let signature = sign_body(&Secret::new("x".into()), b"body");
        assert!(!signature_is_valid(&secret, b"body", &signature));
    }

    #[test]
    fn garbage_signatures_fail() {
        let secret = Secret::new("webhook-secret".to_string());
        assert!(!signature_is_valid(&secret, b"body", "not base64!!"));
    }
}
