//! Persisted refresh token rows.
use serde::{Deserialize, Serialize};

/// One row per issued refresh token.
///
/// `id_token` equals the `jti` claim embedded in the signed token, and
/// `token_hash` holds a one-way hash of the full signed string; the raw
/// token is never stored. Once `used` or `revoked` is set the row can never
/// again satisfy redemption; rows are kept for audit and replay detection
/// rather than deleted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshToken {
    pub id_token: String,
    pub id_user: String,
    pub token_hash: String,
    pub expires_at: i64,
    pub used: bool,
    pub revoked: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
