//! Password hashing for merchant accounts (Argon2id with the crate's default parameters).
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::*;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Password hashing failed. {0}")]
pub struct PasswordError(String);

/// Hashes `password` with a fresh random salt. The result is a self-describing PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// Checks `password` against a stored PHC hash string. A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(e) => {
            error!("🔐️ Stored password hash is malformed. {e}");
            return false;
        },
    };
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => true,
        Err(argon2::password_hash::Error::Password) => false,
        Err(e) => {
            error!("🔐️ Password verification failed unexpectedly. {e}");
            false
        },
    }
}
