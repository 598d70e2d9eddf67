//! API error construction.
//!
//! Centralizes HTTP error response shapes so every endpoint returns the same
//! `{code, message}` body. Internal failures log details server-side and
//! return a generic message to the client.
use crate::api::types::ErrorResponse;
use crate::auth::AuthError;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Structured API error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn build(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    build(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn api_conflict(message: &str) -> ApiError {
    build(StatusCode::CONFLICT, "conflict", message)
}

pub fn api_unauthorized(message: &str) -> ApiError {
    build(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub fn api_forbidden(message: &str) -> ApiError {
    build(StatusCode::FORBIDDEN, "forbidden", message)
}

pub fn api_validation_error(message: &str) -> ApiError {
    build(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// 500 from a store failure; logs the detail, returns a generic message.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "storage error");
    build(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_internal_message(message: &str) -> ApiError {
    build(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => api_not_found(&what),
            StoreError::Conflict(what) => api_conflict(&what),
            other => api_internal("storage unavailable", &other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => api_unauthorized("Could not validate credentials"),
            AuthError::Unauthorized(message) => api_unauthorized(&message),
            AuthError::Forbidden(message) => api_forbidden(&message),
            AuthError::BadRequest(message) => api_validation_error(&message),
            AuthError::Store(store) => store.into(),
            AuthError::Internal(detail) => {
                tracing::error!(error = %detail, "auth internal error");
                api_internal_message("internal error")
            }
        }
    }
}
