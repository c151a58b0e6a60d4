//! SQLite operations for user accounts and auth-provider links.
//!
//! Generally clients should never call these methods directly, and prefer to use the [`AuthManagement`] trait
//! methods implemented on the [`SqliteDatabase`](crate::SqliteDatabase) struct instead.

use log::debug;
use sqlx::{Row, SqliteConnection};

use crate::{
    db_types::{AuthProviderLink, NewUser, User},
    traits::AuthApiError,
};

// SQLITE_CONSTRAINT_UNIQUE
const UNIQUE_VIOLATION: &str = "2067";

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, AuthApiError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, AuthApiError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn username_exists(username: &str, conn: &mut SqliteConnection) -> Result<bool, AuthApiError> {
    let row = sqlx::query(r#"SELECT count(id) as "count" FROM users WHERE username = $1"#)
        .bind(username)
        .fetch_one(conn)
        .await?;
    let count: i64 = row.get(0);
    Ok(count > 0)
}

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AuthApiError> {
    let result = sqlx::query_as("INSERT INTO users (username, email, display_name) VALUES ($1, $2, $3) RETURNING *")
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.display_name)
        .fetch_one(conn)
        .await;
    result.map_err(|e| {
        if let sqlx::Error::Database(ref de) = e {
            if de.code().map(|c| c.as_ref() == UNIQUE_VIOLATION).unwrap_or(false) {
                return AuthApiError::UsernameTaken;
            }
        }
        AuthApiError::from(e)
    })
}

pub async fn fetch_provider_link(
    provider: &str,
    subject: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<AuthProviderLink>, AuthApiError> {
    let link = sqlx::query_as("SELECT * FROM auth_providers WHERE provider = $1 AND subject = $2")
        .bind(provider)
        .bind(subject)
        .fetch_optional(conn)
        .await?;
    Ok(link)
}

/// Inserts or refreshes the `(provider, subject)` link. This implementation is an upsert under the hood: an
/// existing link keeps its user and has its `value` (provider-side email) refreshed in place.
pub async fn upsert_provider_link(
    provider: &str,
    subject: &str,
    value: &str,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), AuthApiError> {
    let res = sqlx::query(
        r#"INSERT INTO auth_providers (provider, subject, value, user_id) VALUES ($1, $2, $3, $4)
            ON CONFLICT (provider, subject) DO
            UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP"#,
    )
    .bind(provider)
    .bind(subject)
    .bind(value)
    .bind(user_id)
    .execute(conn)
    .await?;
    debug!("🧑️ Upserted {provider} link for user #{user_id} ({} row(s))", res.rows_affected());
    Ok(())
}
