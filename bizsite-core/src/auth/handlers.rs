use axum::extract::{FromRequest, Query, Request, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::Form;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::guard::wants_html;
use super::token;
use crate::error::{AppError, AppResult};
use crate::models::Session;
use crate::repo::sessions;
use crate::AppState;

/// Where a successful login lands unless `next` says otherwise.
pub const DASHBOARD_PATH: &str = "/admin/dashboard";

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Login credentials from either a JSON or a urlencoded form body.
#[derive(Debug)]
pub struct LoginSubmission {
    pub credentials: LoginRequest,
    pub is_json: bool,
}

#[axum::async_trait]
impl<S> FromRequest<S> for LoginSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        let credentials = if is_json {
            let Json(body) = Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::invalid("body", e.body_text()))?;
            body
        } else {
            let Form(body) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::invalid("body", e.body_text()))?;
            body
        };

        Ok(LoginSubmission { credentials, is_json })
    }
}

/// Only same-site absolute paths are followed after login. Browsers treat
/// `//host` and `/\host` as protocol-relative, so any backslash or control
/// character disqualifies the target.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.chars().any(|c| c == '\\' || c.is_control()) =>
        {
            path
        }
        _ => DASHBOARD_PATH,
    }
}

async fn sign_in(state: &AppState, credentials: LoginRequest) -> AppResult<(Session, String)> {
    let username = credentials.username.unwrap_or_default();
    let password = credentials.password.unwrap_or_default();

    let session = super::authenticate(
        &state.db,
        state.config.session_lifetime(true),
        state.config.bcrypt_cost,
        &username,
        &password,
    )
    .await?;
    let token = state.keys.issue(&session, Utc::now())?;
    Ok((session, token))
}

/// `POST /admin/login`
///
/// JSON callers get `{success, message, redirect, token}` plus the session
/// cookie; form callers are redirected to `next` (or the dashboard) on
/// success and back to the login page on failure.
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    submission: LoginSubmission,
) -> Response {
    let LoginSubmission { credentials, is_json } = submission;
    let secure = state.config.is_production();

    match sign_in(&state, credentials).await {
        Ok((session, token)) => {
            let max_age = (session.expires_at - Utc::now()).num_seconds();
            let cookie = [(header::SET_COOKIE, token::session_cookie(&token, max_age, secure))];
            if is_json {
                (
                    cookie,
                    Json(json!({
                        "success": true,
                        "message": "Login successful",
                        "redirect": DASHBOARD_PATH,
                        "token": token,
                        "expires_at": session.expires_at,
                    })),
                )
                    .into_response()
            } else {
                (cookie, Redirect::to(safe_next(query.next.as_deref()))).into_response()
            }
        }
        Err(err) if is_json => err.into_response(),
        Err(err) => {
            let reason = match err {
                AppError::Validation { .. } => "missing",
                AppError::InvalidCredentials => "invalid",
                other => {
                    error!("Login failed: {}", other);
                    "unavailable"
                }
            };
            Redirect::to(&format!("/admin/login?error={}", reason)).into_response()
        }
    }
}

/// `GET /admin/logout`
///
/// Revokes the presented session, if any, and clears the cookie. Always
/// succeeds.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let claims = token::token_from_headers(&headers).and_then(|t| state.keys.decode(&t));
    if let Some(claims) = claims {
        match sessions::revoke(&state.db, &claims.sid).await {
            Ok(true) => info!("Session {} closed for user {}", claims.sid, claims.sub),
            Ok(false) => {}
            Err(e) => warn!("Failed to revoke session {}: {}", claims.sid, e),
        }
    }

    let clear = [(header::SET_COOKIE, token::clear_cookie(state.config.is_production()))];
    if wants_html(&headers) {
        (clear, Redirect::to("/admin/login")).into_response()
    } else {
        (
            clear,
            Json(json!({ "success": true, "message": "Logged out" })),
        )
            .into_response()
    }
}

/// `GET /admin/check-session`
///
/// Reports the caller's session state without touching it.
pub async fn check_session(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    let session = super::resolve(&state.db, &state.keys, &headers, Utc::now()).await?;
    Ok(Json(match session {
        Some(session) => json!({
            "authenticated": true,
            "is_admin": session.is_admin,
            "username": session.username,
        }),
        None => json!({
            "authenticated": false,
            "is_admin": false,
            "username": null,
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("/api/admin/messages")), "/api/admin/messages");
        assert_eq!(safe_next(Some("//evil.example")), DASHBOARD_PATH);
        assert_eq!(safe_next(Some("https://evil.example")), DASHBOARD_PATH);
        assert_eq!(safe_next(Some("/\\evil.example")), DASHBOARD_PATH);
        assert_eq!(safe_next(Some("/admin\\..\\x")), DASHBOARD_PATH);
        assert_eq!(safe_next(Some("/\t/evil.example")), DASHBOARD_PATH);
        assert_eq!(safe_next(None), DASHBOARD_PATH);
    }
}
