use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "bizsite_core=info,tower_http=info";

/// Installs the global subscriber: JSON lines in production, human-readable
/// output elsewhere. `RUST_LOG` overrides [`DEFAULT_FILTER`].
pub fn init(production: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if production {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Logs each request with its id, and its outcome at a level matching the
/// status class.
pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(request_id = %request_id, method = %method, uri = %uri, "incoming request");

    let response = next.run(request).await;
    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(request_id = %request_id, method = %method, uri = %uri, status = %status, duration_ms, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(request_id = %request_id, method = %method, uri = %uri, status = %status, duration_ms, "request rejected");
    } else {
        tracing::info!(request_id = %request_id, method = %method, uri = %uri, status = %status, duration_ms, "request completed");
    }

    response
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
