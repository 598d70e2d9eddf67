//! One-way hashing for stored secrets.
//!
//! # Purpose
//! Argon2 hash/verify used for two things: user login passwords and
//! refresh-token-at-rest values. The raw refresh token string is hashed
//! before storage so a database leak does not expose usable tokens. No
//! reversible encryption is ever applied to secrets.
use super::AuthError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

/// Hash a secret with a fresh random salt.
pub fn hash_secret(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|err| AuthError::Internal(format!("password hashing failed: {err}")))?;
    Ok(hash.to_string())
}

/// Verify a secret against a stored hash.
///
/// A malformed stored hash verifies as false rather than erroring; callers
/// treat every non-match identically.
pub fn verify_secret(plain: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_never_equals_plaintext_and_round_trips() {
        let hash = hash_secret("hunter2").expect("hash");
        assert_ne!(hash, "hunter2");
        assert!(verify_secret("hunter2", &hash));
        assert!(!verify_secret("hunter3", &hash));
    }

    #[test]
    fn same_secret_hashes_differently_per_salt() {
        let first = hash_secret("hunter2").expect("hash");
        let second = hash_secret("hunter2").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_stored_hash_verifies_false() {
        assert!(!verify_secret("hunter2", "not-a-phc-string"));
    }
}
