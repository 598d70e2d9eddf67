//! Login, refresh, and token-pair issuance.
//!
//! # Purpose
//! Orchestrates credential verification, refresh-token persistence, and
//! rotation. The redemption path here is the only writer of the `used` flag;
//! the atomicity of the check-and-mark lives in the store's
//! `consume_refresh_token`.
use super::password;
use super::token::{Claims, TokenCodec, TokenKind};
use super::AuthError;
use crate::model::{now_epoch_seconds, RefreshToken, User};
use crate::store::BackendStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

pub struct AuthService {
    codec: TokenCodec,
    store: Arc<dyn BackendStore>,
}

impl AuthService {
    pub fn new(codec: TokenCodec, store: Arc<dyn BackendStore>) -> Self {
        Self { codec, store }
    }

    /// Verify credentials and issue a token pair.
    ///
    /// Unknown username and wrong password fail with the identical message
    /// and status. The two branches differ in timing (no hash runs for an
    /// unknown username); responses carry no other distinction.
    pub async fn login(&self, username: &str, plain_password: &str) -> Result<TokenPairResponse, AuthError> {
        let found = self.store.get_user_by_username(username).await?;
        let user = match found {
            Some(user) if password::verify_secret(plain_password, &user.password_hash) => user,
            _ => return Err(AuthError::Unauthorized("Invalid user or password".into())),
        };
        self.issue_pair(&user).await
    }

    /// Issue a fresh pair for an already-validated refresh subject.
    ///
    /// The caller must have redeemed a refresh token first (see
    /// [`AuthService::redeem_refresh`]); by the time this runs, exactly one
    /// old token has been consumed, so issuing here completes the rotation.
    pub async fn refresh(&self, subject: &str) -> Result<TokenPairResponse, AuthError> {
        let user = self
            .store
            .get_user_by_username(subject)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Invalid username".into()))?;
        self.issue_pair(&user).await
    }

    /// Mint an access + refresh pair and persist the refresh metadata.
    ///
    /// The refresh row insert must succeed before the signed string leaves
    /// this function; an insert failure means the token was never issued.
    pub async fn issue_pair(&self, user: &User) -> Result<TokenPairResponse, AuthError> {
        let access_token = self.codec.encode_access(&user.username, &user.email)?;
        let (refresh_token, jti, expires_at) =
            self.codec.encode_refresh(&user.username, &user.email)?;
        let token_hash = password::hash_secret(&refresh_token)?;
        let now = now_epoch_seconds();
        self.store
            .insert_refresh_token(RefreshToken {
                id_token: jti,
                id_user: user.id_user.clone(),
                token_hash,
                expires_at,
                used: false,
                revoked: false,
                created_at: now,
                updated_at: now,
            })
            .await?;
        Ok(TokenPairResponse {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Resolve the user behind a presented access token.
    ///
    /// A valid token whose subject no longer exists (deleted user) fails the
    /// same way as a bad token.
    pub async fn resolve_access(&self, raw_token: &str) -> Result<User, AuthError> {
        let claims = self.codec.decode(raw_token, TokenKind::Access)?;
        self.store
            .get_user_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    /// Validate and consume a presented refresh token.
    ///
    /// Order of checks: decode as kind=refresh, require `jti`, load the row,
    /// match the presented string against the stored hash (a forged or
    /// colliding `jti` is not enough, the raw token itself must match),
    /// reject expired/used/revoked rows, then atomically mark used. A row
    /// that loses the mark race fails here like any other invalid token.
    pub async fn redeem_refresh(&self, raw_token: &str) -> Result<Claims, AuthError> {
        let claims = self.codec.decode(raw_token, TokenKind::Refresh)?;
        let jti = claims
            .jti
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        let record = self
            .store
            .get_refresh_token(jti)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !password::verify_secret(raw_token, &record.token_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        let now = now_epoch_seconds();
        if record.expires_at <= now || record.used || record.revoked {
            return Err(AuthError::InvalidCredentials);
        }
        if !self.store.consume_refresh_token(jti, now).await? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(claims)
    }
}
