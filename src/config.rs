use std::env;

/// Issuer claim stamped on every token minted by the IMS auth service.
pub const DEFAULT_JWT_ISSUER: &str = "ims-auth-service";

/// AppConfig
///
/// Immutable runtime configuration, loaded once at startup and shared through
/// `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and secret strictness.
    pub env: Env,
    // HS256 secret shared with the auth service.
    pub jwt_secret: String,
    // Expected `iss` claim. Tokens without an issuer are still accepted.
    pub jwt_issuer: String,
    // Base URL of the auth service, used to look up users the token cannot describe.
    pub auth_service_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Origins allowed by the CORS layer (the SPA).
    pub cors_origins: Vec<String>,
}

/// Env
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "your-secret-key-change-in-production-use-env-var";

impl Default for AppConfig {
    /// Safe values for tests; never reads the environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
            auth_service_url: "http://localhost:5001".to_string(),
            bind_addr: "0.0.0.0:8010".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `JWT_SECRET_KEY` is missing, so the guard
    /// never starts validating tokens against a well-known secret.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("JWT_SECRET_KEY")
                .expect("FATAL: JWT_SECRET_KEY must be set in production."),
            Env::Local => env::var("JWT_SECRET_KEY").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        let default_auth_url = match env {
            Env::Production => "http://auth-service:5001",
            Env::Local => "http://localhost:5001",
        };

        Self {
            jwt_secret,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_JWT_ISSUER.to_string()),
            auth_service_url: env::var("AUTH_SERVICE_URL")
                .unwrap_or_else(|_| default_auth_url.to_string())
                .trim_end_matches('/')
                .to_string(),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8010".to_string()),
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            ),
            env,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
