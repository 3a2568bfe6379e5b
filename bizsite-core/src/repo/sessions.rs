use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::session::{Session, SessionRecord};

/// Inserts a session row on the caller's connection.
pub async fn insert(conn: &mut SqliteConnection, record: &SessionRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, remember, created_at, expires_at, revoked)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(record.user_id)
    .bind(record.remember)
    .bind(record.created_at)
    .bind(record.expires_at)
    .bind(record.revoked)
    .execute(conn)
    .await?;
    Ok(())
}

/// Resolves a session id to a live session.
///
/// Returns `None` when the row is missing, revoked, expired as of `now`, or
/// its user no longer exists. The caller still has to check `is_admin`.
pub async fn find_active(
    pool: &SqlitePool,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        r#"
        SELECT s.id, s.user_id, u.username, u.is_admin, s.remember, s.expires_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.id = ? AND s.revoked = 0 AND s.expires_at > ?
        "#,
    )
    .bind(session_id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Marks a session revoked. Revoking twice is harmless; returns whether a
/// live session was revoked by this call.
pub async fn revoke(pool: &SqlitePool, session_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE sessions SET revoked = 1 WHERE id = ? AND revoked = 0")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
