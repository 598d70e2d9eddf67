//! Request and response bodies of the HTTP API.
//!
//! Entity responses reuse the model records directly; only request shapes and
//! the uniform error body live here. Plaintext passwords appear exclusively
//! in request types and are hashed before they reach a store.
use crate::model::Role;
use serde::{Deserialize, Serialize};

/// Uniform error body: a stable machine code plus a human-readable message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
}

/// Form body of the login endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInstitutionRequest {
    pub institution_name: String,
}

/// Body of the membership upsert endpoint.
#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreatePpdaRequest {
    pub id_institution: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePpdaRequest {
    pub id_institution: Option<String>,
}

/// Query string of the PPDA list endpoint.
#[derive(Debug, Deserialize)]
pub struct PpdaListQuery {
    pub institution_id: String,
}
