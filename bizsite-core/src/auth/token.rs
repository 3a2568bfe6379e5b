use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Session;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "bizsite_session";

/// Claims inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Session row id.
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing and verification keys derived from the session secret.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a token for `session`, expiring with it.
    pub fn issue(&self, session: &Session, issued_at: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            sub: session.user_id.to_string(),
            sid: session.id.clone(),
            iat: issued_at.timestamp(),
            exp: session.expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign session token: {}", e)))
    }

    /// Verifies signature and expiry. Any failure yields `None`.
    pub fn decode(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .ok()
    }
}

/// Session token from the `Authorization: Bearer` header, else from the
/// session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying `token` for `max_age_secs` seconds.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        max_age_secs.max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            id: "7b6c".into(),
            user_id: 3,
            username: "admin".into(),
            is_admin: true,
            remember: true,
            expires_at,
        }
    }

    #[test]
    fn test_issue_then_decode() {
        let keys = SessionKeys::new("test-secret");
        let now = Utc::now();
        let token = keys.issue(&session(now + Duration::hours(1)), now).unwrap();

        let claims = keys.decode(&token).unwrap();
        assert_eq!(claims.sub, "3");
        assert_eq!(claims.sid, "7b6c");
        assert_eq!(claims.iat, now.timestamp());
    }

    #[test]
    fn test_foreign_or_expired_tokens_rejected() {
        let now = Utc::now();
        let token = SessionKeys::new("one")
            .issue(&session(now + Duration::hours(1)), now)
            .unwrap();
        assert!(SessionKeys::new("two").decode(&token).is_none());

        let keys = SessionKeys::new("one");
        let stale = keys
            .issue(&session(now - Duration::hours(2)), now - Duration::hours(3))
            .unwrap();
        assert!(keys.decode(&stale).is_none());
        assert!(keys.decode("not.a.token").is_none());
    }

    #[test]
    fn test_token_from_cookie_or_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; bizsite_session=abc.def; other=1"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("xyz"));

        assert!(token_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("tok", 3600, true);
        assert!(cookie.starts_with("bizsite_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.ends_with("; Secure"));
        assert!(clear_cookie(false).contains("Max-Age=0"));
    }
}
