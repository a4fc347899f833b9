//! Routing tables for the three listeners.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::http::handlers::{self, AppState};
use crate::http::middleware::InstrumentLayer;
use crate::observability::metrics::{MetricsRegistry, RequestMetrics};

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Application router, wrapped by request instrumentation.
///
/// Every method is accepted. Any path not listed falls through to the echo
/// handler. With
/// `include_probes` the liveness and readiness routes are served here too.
pub fn app_router(state: AppState, metrics: RequestMetrics, include_probes: bool) -> Router {
    let mut router = Router::new()
        .route("/", any(handlers::echo))
        .route("/load", any(handlers::load))
        .route("/delay", any(handlers::delay));

    if include_probes {
        router = router
            .route("/ready", any(handlers::probe))
            .route("/live", any(handlers::probe));
    }

    router
        .fallback(handlers::echo)
        .with_state(state)
        .layer(InstrumentLayer::new(metrics))
        .layer(TraceLayer::new_for_http())
}

/// Health-check router. Not instrumented.
pub fn health_router() -> Router {
    Router::new()
        .route("/ready", any(handlers::probe))
        .route("/live", any(handlers::probe))
}

/// Metrics router exposing the registry.
pub fn metrics_router(registry: Arc<MetricsRegistry>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(registry)
}

async fn render_metrics(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        registry.render(),
    )
}
