use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use tracing::debug;

use crate::error::AppError;
use crate::AppState;

/// Admin gate for every administrative route.
///
/// On success the validated [`crate::models::Session`] is inserted into the
/// request extensions for downstream handlers. Otherwise JSON callers get a
/// `401`, and browsers (`Accept: text/html`) are redirected to the login
/// page with the original path in `next`.
pub async fn require_admin(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let resolved = super::resolve(&state.db, &state.keys, request.headers(), Utc::now()).await;
    match resolved {
        Ok(Some(session)) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Ok(None) => {
            debug!("Rejected unauthenticated request to {}", request.uri().path());
            if wants_html(request.headers()) {
                let target = request
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                login_redirect(target).into_response()
            } else {
                AppError::Unauthorized.into_response()
            }
        }
        Err(err) => err.into_response(),
    }
}

/// True when the client prefers an HTML page over JSON.
pub fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

pub fn login_redirect(next: &str) -> Redirect {
    Redirect::to(&format!("/admin/login?next={}", encode_component(next)))
}

/// Percent-encodes everything outside the RFC 3986 unreserved set and `/`.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}
