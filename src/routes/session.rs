use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Session-Aware Router Module
///
/// Handlers here take a `SessionContext`, which never rejects. An absent or
/// invalid token reaches the guard as an anonymous session and comes back as
/// a `REDIRECT_LOGIN` decision or an empty menu.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        // POST /api/v1/access/evaluate
        // One guard decision for the path the UI is about to render.
        .route("/api/v1/access/evaluate", post(handlers::evaluate_access))
        // GET /api/v1/access/navigation
        // The role-based menu for the current session.
        .route("/api/v1/access/navigation", get(handlers::get_navigation))
}
