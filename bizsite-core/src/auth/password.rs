use tracing::warn;

use crate::error::{AppError, AppResult};

/// Hashes `password` with bcrypt on the blocking pool.
pub async fn hash(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

/// Checks `password` against `stored`.
///
/// With no stored hash the password is hashed at `cost` and discarded, so an
/// unknown user takes as long as a wrong password for hashes stored at that
/// cost; the result is always `false`. A stored hash that bcrypt cannot
/// parse counts as a mismatch.
pub async fn verify(password: &str, stored: Option<&str>, cost: u32) -> AppResult<bool> {
    let password = password.to_owned();
    let target = stored.map(str::to_owned);

    tokio::task::spawn_blocking(move || match target {
        Some(hash) => bcrypt::verify(password, &hash).unwrap_or_else(|e| {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }),
        None => {
            let _ = bcrypt::hash(password, cost);
            false
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))
}
