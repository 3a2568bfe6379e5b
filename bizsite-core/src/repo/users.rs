use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::auth::password;
use crate::error::AppResult;
use crate::models::user::NewUser;
use crate::models::User;

/// Looks up a user by login name, but only if they may administer the site.
pub async fn find_admin_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ? AND is_admin = 1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Creates a user, hashing the password with bcrypt at `cost`.
///
/// # Errors
///
/// Returns `AppError::Conflict` if the username is taken.
pub async fn create(pool: &SqlitePool, new_user: &NewUser, cost: u32) -> AppResult<User> {
    let password_hash = password::hash(&new_user.password, cost).await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, is_admin, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(password_hash)
    .bind(new_user.is_admin)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    info!("Created user {} (admin: {})", user.username, user.is_admin);
    Ok(user)
}

/// Records a successful login. Runs on the caller's connection so it can
/// share a transaction with the session insert.
pub async fn touch_last_login(
    conn: &mut SqliteConnection,
    user_id: i64,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(at)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(total)
}
