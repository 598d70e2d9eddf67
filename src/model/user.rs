//! User identity records and patch payloads.
use serde::{Deserialize, Serialize};

/// Identity record owning refresh tokens and institution memberships.
///
/// `password_hash` is never serialized; API responses expose their own view
/// of a user without credential material.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id_user: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Explicit field-by-field merge payload for user updates.
///
/// Every field is optional; `None` leaves the stored value untouched. The
/// password arrives here already hashed, handlers never pass plaintext down
/// to the store.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_admin: Option<bool>,
}
