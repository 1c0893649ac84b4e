use crate::{
    AppState,
    auth::{AuthUser, SessionContext},
    error::{ApiError, ErrorEnvelope},
    guard,
    models::{
        AccessDecisionRequest, AccessDecisionResponse, CurrentUser, NavigationResponse, RouteRule,
    },
    route_table::normalize_path,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

// --- Handlers ---

/// list_routes
///
/// [Public Route] The static route table, so the UI can register its guarded
/// views from a single source.
#[utoipa::path(
    get,
    path = "/api/v1/access/routes",
    responses((status = 200, description = "Route table", body = [RouteRule]))
)]
pub async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteRule>> {
    Json(state.routes.rules().to_vec())
}

/// evaluate_access
///
/// [Session-Aware Route] Runs the guard for one navigation attempt. The caller
/// may be anonymous; that is a decision (`REDIRECT_LOGIN`), not an error.
#[utoipa::path(
    post,
    path = "/api/v1/access/evaluate",
    request_body = AccessDecisionRequest,
    responses(
        (status = 200, description = "Decision", body = AccessDecisionResponse),
        (status = 400, description = "Malformed body or empty path", body = ErrorEnvelope),
        (status = 404, description = "No rule for path", body = ErrorEnvelope)
    )
)]
pub async fn evaluate_access(
    State(state): State<AppState>,
    context: SessionContext,
    payload: Result<Json<AccessDecisionRequest>, JsonRejection>,
) -> Result<Json<AccessDecisionResponse>, ApiError> {
    let Json(payload) =
        payload.map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;

    if payload.path.trim().is_empty() {
        return Err(ApiError::invalid_input("path must not be empty"));
    }

    let path = normalize_path(&payload.path);
    let rule = state
        .routes
        .resolve(&path)
        .ok_or_else(|| ApiError::route_not_found(&path))?;

    let decision = guard::evaluate(&context.session, context.user.as_ref(), rule, &path);
    let account_state = guard::account_state(&context.session, context.user.as_ref());

    tracing::debug!(
        path = %path,
        rule = %rule.path,
        ?decision,
        ?account_state,
        "access evaluated"
    );

    Ok(Json(AccessDecisionResponse {
        path,
        decision,
        redirect_to: decision.redirect_target().map(str::to_string),
        account_state,
    }))
}

/// get_navigation
///
/// [Session-Aware Route] The destinations the caller may open right now,
/// used to build the role-based menu. Anonymous callers get an empty list.
#[utoipa::path(
    get,
    path = "/api/v1/access/navigation",
    responses((status = 200, description = "Reachable routes", body = NavigationResponse))
)]
pub async fn get_navigation(
    State(state): State<AppState>,
    context: SessionContext,
) -> Json<NavigationResponse> {
    let routes = state
        .routes
        .reachable(&context.session, context.user.as_ref());

    Json(NavigationResponse {
        account_state: guard::account_state(&context.session, context.user.as_ref()),
        routes,
    })
}

/// get_me
///
/// [Authenticated Route] The resolved user snapshot the guard would use.
/// Inactive accounts are served too; this backs the profile screen.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "No valid session", body = ErrorEnvelope)
    )
)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<CurrentUser> {
    Json(user)
}
