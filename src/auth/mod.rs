//! Authentication and authorization core.
//!
//! # Purpose
//! Groups password hashing, the JWT codec, the login/refresh service, the
//! request-level access gate, and the institution RBAC gate.
use crate::store::StoreError;
use thiserror::Error;

pub mod gate;
pub mod handlers;
pub mod password;
pub mod rbac;
pub mod service;
pub mod token;

/// Failure taxonomy of the auth core.
///
/// Variants map 1:1 onto HTTP statuses at the API boundary; nothing in this
/// module is swallowed or retried; a failed check always aborts the
/// request. Messages stay generic so responses never reveal which specific
/// credential check failed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing, malformed, expired, or wrong-kind token material.
    #[error("Could not validate credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}
