//! Salted argon2 password hashing.
//!
//! Hashing is deliberately slow, so both operations run on the blocking pool.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

use crate::error::AppError;

/// A well-formed argon2id hash with default parameters that matches no
/// password. Verifying against it costs the same as a real verify.
pub const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGFza21hbmFnZXJkdW1teQ$taLJYlBhI2bqJy/6xtl0Sq9LRarNlqp8/Lkx7jtVglk";

/// Hashes `password` into a PHC string with a fresh random salt.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Hashing task failed: {e}")))?
}

/// Returns `Ok(false)` on mismatch and also when `stored_hash` is not a valid
/// PHC string, so a corrupt row reads as bad credentials.
pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let parsed_hash = match PasswordHash::new(&stored_hash) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!("Stored password hash is unparsable: {}", e);
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Verification task failed: {e}")))
}
