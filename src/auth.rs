use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::{
    config::AppConfig,
    directory::UserDirectoryState,
    error::ApiError,
    models::{CurrentUser, Role, Session},
};

/// Claims
///
/// Payload of the access tokens minted by the IMS auth service (HS256).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Business identifier of the user. Absent for the built-in administrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
    pub exp: usize,
}

/// Why a presented token does not count as a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    Expired,
    IssuerMismatch(String),
    MissingSubject,
    Invalid(String),
}

/// bearer_token
///
/// Extracts the raw token from `Authorization: Bearer <token>`. The scheme is
/// matched case-insensitively; blank tokens count as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// decode_claims
///
/// Verifies signature and expiry, then applies the issuer rule: a token may
/// omit `iss`, but if present it must match the configured issuer. Only the
/// built-in administrator may omit `sub`.
pub fn decode_claims(token: &str, config: &AppConfig) -> Result<Claims, TokenRejection> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.validate_aud = false;

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenRejection::Expired,
            _ => TokenRejection::Invalid(e.to_string()),
        })?
        .claims;

    if let Some(iss) = &claims.iss {
        if iss != &config.jwt_issuer {
            return Err(TokenRejection::IssuerMismatch(iss.clone()));
        }
    }

    // The auth service mints admin tokens with exactly this role string.
    let is_admin = claims.role.as_deref() == Some(Role::Admin.as_str());
    if claims.sub.is_none() && !is_admin {
        return Err(TokenRejection::MissingSubject);
    }

    Ok(claims)
}

/// user_from_claims
///
/// Builds the user snapshot straight from the token when it carries a known
/// role and an explicit activation flag. Anything less returns `None` and the
/// caller falls back to the user directory.
pub fn user_from_claims(claims: &Claims) -> Option<CurrentUser> {
    let role: Role = claims.role.as_deref()?.parse().ok()?;
    let is_active = claims.is_active?;

    let username = claims
        .username
        .clone()
        .or_else(|| claims.sub.clone())
        .unwrap_or_else(|| role.to_string());

    Some(CurrentUser {
        id: claims.sub.clone(),
        username,
        role,
        is_active,
    })
}

/// SessionContext
///
/// The immutable snapshot handed to the guard: session presence plus the
/// current user, if one could be resolved. Never rejects a request; a missing,
/// dead or forged token simply yields an anonymous session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub session: Session,
    pub user: Option<CurrentUser>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// resolve
    ///
    /// Token validation first, then claims, then the directory. Directory
    /// failures degrade to "role unknown".
    pub async fn resolve(
        headers: &HeaderMap,
        config: &AppConfig,
        directory: &UserDirectoryState,
    ) -> Self {
        let Some(token) = bearer_token(headers) else {
            return Self::anonymous();
        };

        let claims = match decode_claims(token, config) {
            Ok(claims) => claims,
            Err(rejection) => {
                tracing::debug!(?rejection, "bearer token rejected; treating request as anonymous");
                return Self::anonymous();
            }
        };

        let session = Session::new(token);

        if let Some(user) = user_from_claims(&claims) {
            return Self {
                session,
                user: Some(user),
            };
        }

        let user = match directory.current_user(token).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(
                    sub = claims.sub.as_deref().unwrap_or("-"),
                    error = %e,
                    "current user could not be resolved; role-gated routes will be denied"
                );
                None
            }
        };

        Self { session, user }
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    UserDirectoryState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let directory = UserDirectoryState::from_ref(state);
        Ok(SessionContext::resolve(&parts.headers, &config, &directory).await)
    }
}

/// AuthUser
///
/// A resolved, authenticated principal. Rejects with 401 when there is no
/// valid token or the user behind it cannot be determined.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    UserDirectoryState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by `auth_middleware` on the authenticated router.
        if let Some(auth_user) = parts.extensions.get::<AuthUser>() {
            return Ok(auth_user.clone());
        }

        let context = match SessionContext::from_request_parts(parts, state).await {
            Ok(context) => context,
            Err(never) => match never {},
        };

        match context.user {
            Some(user) if context.session.has_token() => Ok(AuthUser(user)),
            _ => Err(ApiError::unauthorized()),
        }
    }
}
