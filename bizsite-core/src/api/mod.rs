//! HTTP surface: the public read API, contact intake, and the
//! session-gated admin API.

pub mod admin;
pub mod analytics;
pub mod contact;
pub mod public;

#[cfg(test)]
mod tests;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::response::Json;
use axum::routing::{get, post};
use axum::{middleware, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::guard::require_admin;
use crate::error::{AppError, AppResult};
use crate::query::{Page, PageRequest, DEFAULT_PER_PAGE};
use crate::AppState;

/// Raw list query string. Every value is kept as text so that bad input
/// falls back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub read: Option<String>,
    pub service: Option<String>,
    pub active: Option<String>,
    pub category: Option<String>,
    pub published: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_params(self.page.as_deref(), self.per_page.as_deref(), DEFAULT_PER_PAGE)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    pub permanent: Option<String>,
}

impl DeleteParams {
    pub fn is_permanent(&self) -> bool {
        matches!(
            self.permanent.as_deref().map(str::trim),
            Some("true") | Some("1") | Some("yes")
        )
    }
}

/// Numeric `:id` path segment. Malformed ids are rejected with the usual
/// JSON error body instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::invalid("id", rejection.body_text()))?;
        Ok(IdPath(id))
    }
}

/// Unwraps a JSON body, turning malformed payloads into validation errors.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::invalid("body", rejection.body_text()))
}

/// `{success, <key>: items, pagination}` list envelope.
pub(crate) fn paged<T: Serialize>(key: &'static str, page: Page<T>) -> AppResult<Json<Value>> {
    let items = serde_json::to_value(&page.items)
        .map_err(|e| AppError::Internal(format!("failed to encode {}: {}", key, e)))?;
    Ok(Json(json!({
        "success": true,
        key: items,
        "pagination": page.meta,
    })))
}

/// `{success, message, data}` envelope for successful mutations.
pub(crate) fn done<T: Serialize>(message: &str, data: T) -> AppResult<Json<Value>> {
    let data = serde_json::to_value(data)
        .map_err(|e| AppError::Internal(format!("failed to encode response: {}", e)))?;
    Ok(Json(json!({
        "success": true,
        "message": message,
        "data": data,
    })))
}

/// Unauthenticated routes under `/api`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/contact", post(contact::submit))
        .route("/api/projects", get(public::list_projects))
        .route("/api/testimonials", get(public::list_testimonials))
        .route("/api/blog", get(public::list_posts))
        .route("/api/blog/:slug", get(public::get_post))
}

/// Routes under `/api/admin`, all behind the admin gate.
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/messages", get(admin::list_messages))
        .route("/api/admin/messages/services", get(admin::message_services))
        .route(
            "/api/admin/messages/:id",
            get(admin::get_message).delete(admin::delete_message),
        )
        .route("/api/admin/messages/:id/mark-read", post(admin::mark_message_read))
        .route("/api/admin/messages/:id/reply", post(admin::reply_message))
        .route(
            "/api/admin/projects",
            get(admin::list_projects).post(admin::create_project),
        )
        .route("/api/admin/projects/categories", get(admin::project_categories))
        .route(
            "/api/admin/projects/:id",
            get(admin::get_project)
                .put(admin::update_project)
                .delete(admin::delete_project),
        )
        .route(
            "/api/admin/testimonials",
            get(admin::list_testimonials).post(admin::create_testimonial),
        )
        .route(
            "/api/admin/testimonials/:id",
            get(admin::get_testimonial)
                .put(admin::update_testimonial)
                .delete(admin::delete_testimonial),
        )
        .route(
            "/api/admin/blog",
            get(admin::list_posts).post(admin::create_post),
        )
        .route("/api/admin/blog/categories", get(admin::blog_categories))
        .route(
            "/api/admin/blog/:id",
            get(admin::get_post)
                .put(admin::update_post)
                .delete(admin::delete_post),
        )
        .route("/api/admin/analytics", get(analytics::overview))
        .route("/api/admin/stats", get(analytics::stats))
        .route("/api/admin/recent-activity", get(analytics::recent_activity))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_permanent_flag() {
        let params = |v: Option<&str>| DeleteParams {
            permanent: v.map(str::to_string),
        };
        assert!(params(Some("true")).is_permanent());
        assert!(params(Some("1")).is_permanent());
        assert!(!params(Some("false")).is_permanent());
        assert!(!params(None).is_permanent());
    }

    #[test]
    fn test_page_request_from_params() {
        let params = ListParams {
            page: Some("x".into()),
            per_page: Some("500".into()),
            ..Default::default()
        };
        assert_eq!(params.page_request(), PageRequest::new(1, 100));
    }
}
