use log::*;

use crate::{
    db_types::{NewUser, User},
    traits::{AuthApiError, AuthManagement},
};

/// A third-party identity whose credential has already been verified by the caller. The engine never sees raw
/// credentials; verification is the server's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider tag, e.g. `google`.
    pub provider: String,
    /// The provider's stable subject id for the person.
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}

/// `AuthApi` resolves verified provider identities to local user accounts: find by provider link, fall back to the
/// email, or create a fresh account with a derived-unique username.
#[derive(Debug, Clone)]
pub struct AuthApi<B> {
    db: B,
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

// The username suffix search has to stop somewhere; beyond this the local-part is pathological.
const MAX_USERNAME_SUFFIX: u32 = 10_000;

impl<B> AuthApi<B>
where B: AuthManagement
{
    /// Resolve a verified identity to a local user, creating the user on first login.
    ///
    /// * An existing `(provider, subject)` link wins outright; a changed provider email updates the link's stored
    ///   value without touching the user record.
    /// * Otherwise the identity's email is matched against existing users.
    /// * Otherwise a new user is created, with a username derived from the email's local part; numeric suffixes
    ///   are appended until the username is free.
    ///
    /// Inactive accounts are rejected with [`AuthApiError::AccountDisabled`] before any link is written.
    pub async fn login_with_provider(&self, identity: VerifiedIdentity) -> Result<User, AuthApiError> {
        if let Some(link) = self.db.fetch_provider_link(&identity.provider, &identity.subject).await? {
            let user = self.db.fetch_user_by_id(link.user_id).await?.ok_or(AuthApiError::UserNotFound)?;
            if !user.is_active {
                info!("🔑️ Rejecting login for disabled account #{}", user.id);
                return Err(AuthApiError::AccountDisabled);
            }
            if link.value != identity.email {
                debug!("🔑️ Provider email changed for user #{}; refreshing the link record", user.id);
                self.db
                    .upsert_provider_link(&identity.provider, &identity.subject, &identity.email, user.id)
                    .await?;
            }
            return Ok(user);
        }

        let user = match self.db.fetch_user_by_email(&identity.email).await? {
            Some(user) => user,
            None => {
                let username = self.derive_username(&identity.email).await?;
                debug!("🔑️ First login for {}; creating user '{username}'", identity.provider);
                self.db
                    .create_user(NewUser {
                        username,
                        email: identity.email.clone(),
                        display_name: identity.name.clone(),
                    })
                    .await?
            },
        };
        if !user.is_active {
            info!("🔑️ Rejecting login for disabled account #{}", user.id);
            return Err(AuthApiError::AccountDisabled);
        }
        self.db.upsert_provider_link(&identity.provider, &identity.subject, &identity.email, user.id).await?;
        Ok(user)
    }

    /// Derives a unique username from an email's local part: `alice@x.com` becomes `alice`, then `alice1`,
    /// `alice2`, … until a free name is found.
    async fn derive_username(&self, email: &str) -> Result<String, AuthApiError> {
        let base = username_base(email);
        if !self.db.username_exists(&base).await? {
            return Ok(base);
        }
        for suffix in 1..=MAX_USERNAME_SUFFIX {
            let candidate = format!("{base}{suffix}");
            if !self.db.username_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        error!("🔑️ Could not find a free username for base '{base}' after {MAX_USERNAME_SUFFIX} attempts");
        Err(AuthApiError::UsernameExhausted)
    }
}

/// The sanitised local part of an email address: lowercase, letters/digits/dot/underscore/dash only.
fn username_base(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .to_ascii_lowercase();
    if base.is_empty() {
        "user".to_string()
    } else {
        base
    }
}
