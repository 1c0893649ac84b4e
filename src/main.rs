use ims_access_guard::{
    AppState, HttpUserDirectory, UserDirectoryState,
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, builds the state and serves HTTP.
#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ims_access_guard=debug,tower_http=info".into());

    // Pretty output locally, JSON for the log aggregator in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Access guard starting in {:?} mode", config.env);

    let directory = Arc::new(HttpUserDirectory::new(&config.auth_service_url)) as UserDirectoryState;
    tracing::info!(auth_service = %config.auth_service_url, "user directory configured");

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, directory));

    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}
