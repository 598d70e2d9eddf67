//! Request-level access gate.
//!
//! Pulls the bearer token off the request, resolves it to a user, and
//! enforces the admin flag where a route demands it.
use super::service::AuthService;
use super::AuthError;
use crate::model::User;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

/// Extract the bearer token from the Authorization header.
///
/// The scheme is matched case-insensitively; a missing header, a non-bearer
/// scheme, or an empty token all fail identically.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::InvalidCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidCredentials)?;
    let mut parts = value.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(token.trim())
        }
        _ => Err(AuthError::InvalidCredentials),
    }
}

/// Authenticate the request and return its user.
pub async fn current_user(auth: &AuthService, headers: &HeaderMap) -> Result<User, AuthError> {
    let token = extract_bearer(headers)?;
    auth.resolve_access(token).await
}

/// Reject non-admin callers on admin-only routes.
pub fn require_admin(user: &User) -> Result<(), AuthError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AuthError::Unauthorized("User is not admin".into()))
    }
}
