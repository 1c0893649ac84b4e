use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every handler here extracts `AuthUser`; the `auth_middleware` layer applied in
/// `create_router` rejects unauthenticated requests before routing reaches them.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The user snapshot the guard evaluates against, active or not.
        .route("/me", get(handlers::get_me))
}
