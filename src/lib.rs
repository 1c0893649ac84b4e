use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// The guard itself and the data it decides over.
pub mod guard;
pub mod models;
pub mod route_table;

// Session resolution and its collaborators.
pub mod auth;
pub mod directory;

// HTTP surface.
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;

use auth::AuthUser;
use routes::{authenticated, public, session};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use directory::{HttpUserDirectory, MockUserDirectory, UserDirectoryState};
pub use guard::evaluate;
pub use route_table::RouteTable;

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_routes, handlers::evaluate_access, handlers::get_navigation,
        handlers::get_me
    ),
    components(
        schemas(
            models::Role, models::RouteRule, models::Decision, models::AccountState,
            models::CurrentUser, models::AccessDecisionRequest, models::AccessDecisionResponse,
            models::NavigationResponse, error::ErrorEnvelope, error::ErrorBody,
        )
    ),
    tags(
        (name = "ims-access-guard", description = "IMS navigation access guard")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable application state. Cloned per request; every field is
/// either an `Arc` or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Resolves users whose token does not describe them.
    pub directory: UserDirectoryState,
    /// The static route table.
    pub routes: Arc<RouteTable>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, directory: UserDirectoryState) -> Self {
        Self {
            directory,
            routes: Arc::new(RouteTable::ims()),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for UserDirectoryState {
    fn from_ref(app_state: &AppState) -> UserDirectoryState {
        app_state.directory.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects requests on the authenticated router before they reach a handler.
/// The resolved user is stashed in the request extensions so the handler's own
/// `AuthUser` extraction reuses it instead of resolving the session again.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the routers, the docs and the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(session::session_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// cors_layer
///
/// Only the configured SPA origins may call the guard. A `*` entry opens the
/// guard to any origin, without credentials. Origins that are not valid
/// header values are skipped with a warning.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        // tower-http refuses credentials alongside a wildcard origin.
        return base.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

/// trace_span_logger
///
/// Span for every request, carrying the `x-request-id` so all log lines of one
/// request correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
