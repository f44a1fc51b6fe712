/// Argon2id password hashing
use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

/// Hash verified when no account matches, so both login failures cost an
/// Argon2 verification
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| PasswordHasher::hash("teamhub-no-such-account").ok());

pub struct PasswordHasher;

impl PasswordHasher {
    /// Hash a password with a fresh random salt (PHC string format)
    pub fn hash(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash
    ///
    /// A malformed stored hash is an internal error, not a mismatch.
    pub fn verify(password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Stored password hash is invalid: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Run a verification against the dummy hash; always false
    pub fn verify_dummy(password: &str) -> bool {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = Self::verify(password, hash);
        }
        false
    }
}
