use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User model representing an account in the system.
///
/// This struct maps to the `users` table. Only users with `is_admin` set can
/// authenticate into the administrative surfaces.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Surrogate identifier assigned by the store
    pub id: i64,

    /// Login name (unique)
    pub username: String,

    /// Contact email address
    pub email: String,

    /// Bcrypt hashed password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether the user may access the admin panel
    pub is_admin: bool,

    /// Timestamp when the user was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the user's last successful login
    pub last_login: Option<DateTime<Utc>>,
}

/// User creation request (plaintext password, hashed before storage)
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

/// User response (public representation, excludes the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}
