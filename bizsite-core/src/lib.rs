//! Backend for a small-business showcase site: public portfolio and blog
//! reads, contact intake, and a session-protected admin API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod repo;
pub mod seed;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::{middleware, Router};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use auth::token::SessionKeys;
use config::Config;

/// Shared handles available to every route handler.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub db: SqlitePool,
    pub config: Arc<Config>,
    /// Signing keys for session tokens, derived from `config.session_secret`
    pub keys: Arc<SessionKeys>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let keys = SessionKeys::new(&config.session_secret);
        Self {
            db,
            config: Arc::new(config),
            keys: Arc::new(keys),
        }
    }
}

/// Liveness probe.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "bizsite-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe; `503` when the database does not answer.
async fn db_health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let latency = db::ping(&state.db).await.map_err(|e| {
        error!("Database health check failed: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(json!({
        "status": "ok",
        "database": "connected",
        "latency_ms": latency.as_millis() as u64
    })))
}

/// Builds the CORS policy from the configured origins. Origins that are not
/// valid header values are skipped; an empty list allows no cross-origin
/// callers.
fn configure_cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Creates the application router with every route and middleware layer.
pub fn create_router(state: AppState) -> Router {
    let cors = configure_cors(&state.config.cors_origins);
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/health/db", get(db_health_check))
        .route("/admin/login", post(auth::handlers::login))
        .route("/admin/logout", get(auth::handlers::logout))
        .route("/admin/check-session", get(auth::handlers::check_session))
        .merge(api::public_routes())
        .merge(api::admin_routes(state.clone()))
        .layer(logging::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::log_request))
        .layer(logging::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .with_state(state)
}
