//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Extra body allowance beyond the file ceiling for multipart framing.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/upload", post(handlers::upload))
        .route("/download", get(handlers::download))
        // Health check (intentionally unauthenticated for probes)
        .route("/v1/health", get(handlers::health_check));

    // Conditionally add the metrics endpoint based on config. When
    // enabled, restrict it to authorized scraper IPs at the
    // infrastructure level.
    if state.config.server.metrics_enabled {
        router = router.merge(Router::new().route("/metrics", get(metrics_handler)));
    }

    let body_limit = (state.config.server.max_file_bytes as usize).saturating_add(BODY_LIMIT_SLACK);

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
