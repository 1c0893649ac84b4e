use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity Schemas ---

/// Role
///
/// The closed set of IMS user roles. The wire form is lower-case, matching the
/// `role` claim issued by the auth service and the values stored by the user service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Patient,
    Doctor,
    Radiologist,
    Cashier,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Patient,
        Role::Doctor,
        Role::Radiologist,
        Role::Cashier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Radiologist => "radiologist",
            Role::Cashier => "cashier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role string is not one of the five IMS roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// CurrentUser
///
/// Cached snapshot of the authenticated principal. Owned by the auth service;
/// the guard only ever reads it and accepts that it may be stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CurrentUser {
    /// Business identifier (`USR-000001`). The built-in administrator has none.
    pub id: Option<String>,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
}

/// Session
///
/// Client-held evidence of authentication. Only presence of the token matters
/// to the guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            return Self::anonymous();
        }
        Self { token: Some(token) }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

// --- Routing Schemas ---

/// RouteRule
///
/// Declares which roles may view one UI destination. An empty `allowed_roles`
/// set admits any authenticated role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteRule {
    #[schema(example = "/admin/users")]
    pub path: String,
    #[schema(value_type = Vec<Role>)]
    pub allowed_roles: BTreeSet<Role>,
}

impl RouteRule {
    pub fn new(path: impl Into<String>, allowed_roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            path: path.into(),
            allowed_roles: allowed_roles.into_iter().collect(),
        }
    }

    /// A rule open to every authenticated role.
    pub fn any_role(path: impl Into<String>) -> Self {
        Self::new(path, [])
    }

    pub fn is_role_gated(&self) -> bool {
        !self.allowed_roles.is_empty()
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed_roles.is_empty() || self.allowed_roles.contains(&role)
    }
}

// --- Decision Schemas ---

/// Decision
///
/// The four possible outcomes of one guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Decision {
    Allow,
    RedirectLogin,
    RedirectProfile,
    RedirectHome,
}

impl Decision {
    pub const LOGIN_PATH: &'static str = "/login";
    pub const PROFILE_PATH: &'static str = "/profile";
    pub const HOME_PATH: &'static str = "/";

    /// Where the UI must navigate instead of rendering. `None` for `Allow`.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::RedirectLogin => Some(Self::LOGIN_PATH),
            Decision::RedirectProfile => Some(Self::PROFILE_PATH),
            Decision::RedirectHome => Some(Self::HOME_PATH),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// AccountState
///
/// Session presence crossed with account activation. Transitions happen
/// elsewhere (login, logout, administrative activation); this is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AccountState {
    LoggedOut,
    LoggedInActive,
    LoggedInInactive,
}

// --- Request / Response Payloads ---

/// AccessDecisionRequest
///
/// Input payload for POST /api/v1/access/evaluate.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessDecisionRequest {
    /// The destination the UI is about to render. Query strings and trailing
    /// slashes are tolerated.
    #[schema(example = "/doctor/tests")]
    pub path: String,
}

/// AccessDecisionResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessDecisionResponse {
    /// The normalized path that was evaluated.
    pub path: String,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    pub account_state: AccountState,
}

/// NavigationResponse
///
/// The destinations the caller may open right now, in table order. Used by
/// the UI to build its role-based menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationResponse {
    pub account_state: AccountState,
    pub routes: Vec<RouteRule>,
}
