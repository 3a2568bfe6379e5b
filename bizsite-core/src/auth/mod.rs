//! Authentication gate for the administrative surfaces.
//!
//! Sessions live in the `sessions` table; clients hold a signed token that
//! names the session row. A request is authenticated only when the token
//! verifies, the row is live, and its user is still an administrator.

pub mod guard;
pub mod handlers;
pub mod password;
pub mod token;

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::session::SessionRecord;
use crate::models::Session;
use crate::repo::{sessions, users};
use token::SessionKeys;

/// Verifies administrator credentials and opens a remembered session.
///
/// Unknown users and wrong passwords are indistinguishable to the caller
/// and take the same bcrypt work. On success `last_login` and the new
/// session row are written in one transaction.
///
/// # Arguments
///
/// * `pool` - SQLite connection pool
/// * `lifetime` - How long the new session stays valid
/// * `bcrypt_cost` - Cost stored hashes are created with; unknown users are
///   charged the same work
/// * `username` - Login name, trimmed before lookup
/// * `password` - Plaintext password
///
/// # Errors
///
/// * `AppError::Validation` if either credential is blank
/// * `AppError::InvalidCredentials` if no admin matches
/// * `AppError::Persistence` if the store fails
pub async fn authenticate(
    pool: &SqlitePool,
    lifetime: Duration,
    bcrypt_cost: u32,
    username: &str,
    password: &str,
) -> AppResult<Session> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::missing("username"));
    }
    if password.is_empty() {
        return Err(AppError::missing("password"));
    }

    let user = users::find_admin_by_username(pool, username).await?;
    let stored = user.as_ref().map(|u| u.password_hash.as_str());
    let matches = password::verify(password, stored, bcrypt_cost).await?;

    let user = match user {
        Some(user) if matches => user,
        _ => {
            warn!("Failed login attempt for user: {}", username);
            return Err(AppError::InvalidCredentials);
        }
    };

    let now = Utc::now();
    let record = SessionRecord {
        id: Uuid::new_v4().to_string(),
        user_id: user.id,
        remember: true,
        created_at: now,
        expires_at: now + lifetime,
        revoked: false,
    };

    let mut tx = pool.begin().await?;
    users::touch_last_login(&mut *tx, user.id, now).await?;
    sessions::insert(&mut *tx, &record).await?;
    tx.commit().await?;

    info!("Admin login succeeded for user: {}", user.username);

    Ok(Session {
        id: record.id,
        user_id: user.id,
        username: user.username,
        is_admin: user.is_admin,
        remember: record.remember,
        expires_at: record.expires_at,
    })
}

/// Resolves the session presented in `headers`, if any.
///
/// Returns `Ok(None)` for missing, malformed, expired or revoked tokens and
/// for users who lost admin rights. Only store failures are errors.
pub async fn resolve(
    pool: &SqlitePool,
    keys: &SessionKeys,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> AppResult<Option<Session>> {
    let Some(claims) = token::token_from_headers(headers).and_then(|t| keys.decode(&t)) else {
        return Ok(None);
    };

    let session = sessions::find_active(pool, &claims.sid, now).await?;
    Ok(session.filter(|s| s.is_admin && s.user_id.to_string() == claims.sub))
}
