use thiserror::Error;

use crate::db_types::{AuthProviderLink, NewUser, User};

/// Behaviour for resolving third-party logins to local user accounts.
///
/// Provider identities are linked to users through `(provider, subject)` records, where the subject is the
/// provider's stable id for the person. Emails are a secondary match key: they can change on the provider side, so
/// the link record's `value` tracks the latest one.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, AuthApiError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthApiError>;

    /// Inserts a new user. The username must already be known to be free; a race on the unique index surfaces as
    /// [`AuthApiError::UsernameTaken`].
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    async fn fetch_provider_link(&self, provider: &str, subject: &str)
        -> Result<Option<AuthProviderLink>, AuthApiError>;

    /// Inserts or refreshes the `(provider, subject)` link. An existing link keeps its user and has its `value`
    /// (the provider-side email) updated in place.
    async fn upsert_provider_link(
        &self,
        provider: &str,
        subject: &str,
        value: &str,
        user_id: i64,
    ) -> Result<(), AuthApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("This account has been disabled")]
    AccountDisabled,
    #[error("The user does not exist")]
    UserNotFound,
    #[error("The username is already taken")]
    UsernameTaken,
    #[error("Could not derive a free username")]
    UsernameExhausted,
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}
