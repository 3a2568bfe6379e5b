use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A login session row. The client holds a signed token naming `id`.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: i64,
    pub remember: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

/// A validated session, scoped to one request.
///
/// The admin guard places this in the request extensions; handlers read it
/// back with `Extension<Session>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub username: String,
    pub is_admin: bool,
    pub remember: bool,
    pub expires_at: DateTime<Utc>,
}
