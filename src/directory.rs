use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::models::{CurrentUser, Role};

// 1. UserDirectory Contract
/// UserDirectory
///
/// Resolves the current user for a bearer token when the token's own claims
/// cannot. Production talks to the auth service; tests use `MockUserDirectory`.
///
/// An `Err` means the user could not be determined. Callers treat that as
/// "role unknown" and never surface it as a request failure.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn current_user(&self, token: &str) -> Result<CurrentUser, String>;
}

/// UserDirectoryState
pub type UserDirectoryState = Arc<dyn UserDirectory>;

// 2. The Real Implementation (auth service `/auth/me`)
/// HttpUserDirectory
#[derive(Clone)]
pub struct HttpUserDirectory {
    client: reqwest::Client,
    me_url: String,
}

/// Body of `GET /api/v1/auth/me`. Extra fields (email, name, timestamps) are ignored.
#[derive(Debug, Deserialize)]
struct MeResponse {
    user_id: Option<String>,
    username: String,
    role: String,
    is_active: Option<bool>,
}

impl HttpUserDirectory {
    pub fn new(auth_service_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            client,
            me_url: format!("{}/api/v1/auth/me", auth_service_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn current_user(&self, token: &str) -> Result<CurrentUser, String> {
        let response = self
            .client
            .get(&self.me_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| format!("auth service unreachable: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("auth service answered {}", response.status()));
        }

        let me = response
            .json::<MeResponse>()
            .await
            .map_err(|e| format!("unreadable /auth/me body: {}", e))?;

        into_current_user(me)
    }
}

fn into_current_user(me: MeResponse) -> Result<CurrentUser, String> {
    let role: Role = me.role.parse().map_err(|e| format!("{}", e))?;
    // An absent flag is not evidence of an active account.
    let is_active = me
        .is_active
        .ok_or_else(|| "activation flag missing".to_string())?;

    Ok(CurrentUser {
        id: me.user_id,
        username: me.username,
        role,
        is_active,
    })
}

// 3. The Mock Implementation (For Tests)
/// MockUserDirectory
///
/// Returns a fixed user, or fails every lookup when built with `new_failing`.
/// Clones share one lookup counter.
#[derive(Clone, Default)]
pub struct MockUserDirectory {
    pub user: Option<CurrentUser>,
    lookups: Arc<AtomicUsize>,
}

impl MockUserDirectory {
    pub fn new(user: CurrentUser) -> Self {
        Self {
            user: Some(user),
            lookups: Arc::default(),
        }
    }

    pub fn new_failing() -> Self {
        Self::default()
    }

    /// Number of `current_user` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn current_user(&self, _token: &str) -> Result<CurrentUser, String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.user
            .clone()
            .ok_or_else(|| "Mock Directory Error: Simulation requested".to_string())
    }
}
