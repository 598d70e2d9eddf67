//! JWT minting and verification for access and refresh tokens.
//!
//! # Purpose
//! Centralizes token semantics: a symmetric-secret signature (algorithm
//! configurable at startup), an expiry claim on every token, a `kind` tag
//! separating access from refresh tokens, and a fresh `jti` identifier on
//! each refresh token that keys its persisted row.
//!
//! # Key invariants
//! - Decoding pins the configured algorithm; tokens signed differently fail.
//! - A token only decodes as the kind the caller expects. An access token
//!   presented to the refresh flow (or vice versa) is rejected before any
//!   store lookup happens.
//! - Expiry is validated with zero leeway.
use super::AuthError;
use crate::config::AuthConfig;
use crate::model::now_epoch_seconds;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Claims carried by every issued token.
///
/// `jti` is present only on refresh tokens, where it doubles as the primary
/// key of the persisted refresh-token row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Encodes and verifies signed claims with process-wide key material.
///
/// Constructed once at startup from configuration and shared read-only
/// across requests.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            algorithm: config.algorithm,
            access_ttl_seconds: config.access_token_expire_minutes as i64 * 60,
            refresh_ttl_seconds: config.refresh_token_expire_days as i64 * 86_400,
        }
    }

    /// Mint a short-lived access token for a subject.
    pub fn encode_access(&self, subject: &str, email: &str) -> Result<String, AuthError> {
        let now = now_epoch_seconds();
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            kind: TokenKind::Access.as_str().to_string(),
            jti: None,
            exp: now + self.access_ttl_seconds,
            iat: now,
        };
        self.sign(&claims)
    }

    /// Mint a refresh token with a fresh `jti`.
    ///
    /// Returns the signed string together with the `jti` and absolute expiry
    /// the caller must persist alongside the token hash.
    pub fn encode_refresh(&self, subject: &str, email: &str) -> Result<(String, String, i64), AuthError> {
        let now = now_epoch_seconds();
        let jti = Uuid::new_v4().to_string();
        let expires_at = now + self.refresh_ttl_seconds;
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            kind: TokenKind::Refresh.as_str().to_string(),
            jti: Some(jti.clone()),
            exp: expires_at,
            iat: now,
        };
        let token = self.sign(&claims)?;
        Ok((token, jti, expires_at))
    }

    /// Decode a token, verifying signature, expiry, and kind.
    ///
    /// Every failure collapses into `InvalidCredentials`; callers must not
    /// be able to distinguish a bad signature from an expired token or a
    /// kind mismatch.
    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidCredentials)?;
        if data.claims.kind != expected.as_str() {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(data.claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|err| AuthError::Internal(format!("token encoding failed: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig {
            secret_key: "test-secret".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
        })
    }

    #[test]
    fn access_token_round_trips() {
        let codec = codec();
        let token = codec.encode_access("alice", "alice@example.org").expect("encode");
        let claims = codec.decode(&token, TokenKind::Access).expect("decode");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.email, "alice@example.org");
        assert_eq!(claims.kind, "access");
        assert!(claims.jti.is_none());
    }

    #[test]
    fn refresh_token_carries_matching_jti() {
        let codec = codec();
        let (token, jti, expires_at) = codec
            .encode_refresh("alice", "alice@example.org")
            .expect("encode");
        let claims = codec.decode(&token, TokenKind::Refresh).expect("decode");
        assert_eq!(claims.jti.as_deref(), Some(jti.as_str()));
        assert_eq!(claims.exp, expires_at);
    }

    #[test]
    fn kind_mismatch_is_rejected_both_ways() {
        let codec = codec();
        let access = codec.encode_access("alice", "alice@example.org").expect("encode");
        let (refresh, _, _) = codec
            .encode_refresh("alice", "alice@example.org")
            .expect("encode");
        assert!(matches!(
            codec.decode(&access, TokenKind::Refresh),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            codec.decode(&refresh, TokenKind::Access),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn expired_token_fails_even_with_valid_signature() {
        let codec = codec();
        let now = now_epoch_seconds();
        let claims = Claims {
            sub: "alice".to_string(),
            email: "alice@example.org".to_string(),
            kind: TokenKind::Access.as_str().to_string(),
            jti: None,
            exp: now - 120,
            iat: now - 240,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("encode");
        assert!(matches!(
            codec.decode(&token, TokenKind::Access),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = TokenCodec::new(&AuthConfig {
            secret_key: "other-secret".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
        });
        let token = other.encode_access("alice", "alice@example.org").expect("encode");
        assert!(matches!(
            codec().decode(&token, TokenKind::Access),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
