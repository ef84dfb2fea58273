//! Argon2id password hashing and verification.
//!
//! Hashes are stored in PHC string format so algorithm parameters and the
//! salt travel with the hash itself.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::shared::AppError;

/// Hashes a plaintext password with a fresh random salt
pub fn hash(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hashed = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::Internal)?;
    Ok(hashed.to_string())
}

/// Verifies a plaintext password against a stored PHC-formatted hash.
/// Returns `Ok(false)` on a mismatch; only malformed hashes are errors.
pub fn verify(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(password_hash).map_err(|_| AppError::Internal)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(AppError::Internal),
    }
}
