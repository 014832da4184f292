//! Caller identity extractors.
//!
//! Sessions are issued by the auth gateway in front of this service, which
//! forwards the authenticated caller as headers:
//!
//! - `x-user-id` - the user's UUID
//! - `x-user-role` - `admin` for back-office users

use axum::{extract::FromRequestParts, http::request::Parts};

use bazaar_core::UserId;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
const ADMIN_ROLE: &str = "admin";

fn user_id(parts: &Parts) -> Result<UserId, AppError> {
    let raw = parts
        .headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("missing user identity".into()))?;
    raw.to_str()
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| AppError::Unauthorized("malformed user identity".into()))
}

/// Extractor for the authenticated storefront user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {user}!")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id(parts).map(Self)
    }
}

/// Extractor that requires an admin caller.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub UserId);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = user_id(parts)?;
        let is_admin = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|role| role.trim().eq_ignore_ascii_case(ADMIN_ROLE));
        if !is_admin {
            return Err(AppError::Forbidden("admin role required".into()));
        }
        Ok(Self(user))
    }
}
