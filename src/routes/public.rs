use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Monitoring and the static route table. Nothing here depends on who is asking.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for the compose healthcheck and the API gateway.
        .route("/health", get(|| async { "ok" }))
        // GET /api/v1/access/routes
        // Every guarded UI destination with its allowed roles.
        .route("/api/v1/access/routes", get(handlers::list_routes))
}
