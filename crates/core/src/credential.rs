//! Credential verification and Argon2id password hashing.
//!
//! Stored credentials are PHC-formatted Argon2id strings (algorithm, params and
//! salt embedded in the hash). Callers verify through the [`CredentialVerifier`]
//! trait so the hashing scheme can change without touching the session logic.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Decides whether a submitted secret matches a stored credential blob.
pub trait CredentialVerifier: Send + Sync {
    /// `stored` is `None` when the user does not exist or has no credential yet.
    /// Implementations must spend comparable time on every path.
    fn verify(&self, stored: Option<&str>, submitted: &str) -> bool;
}

/// Hash verified against when there is no usable stored credential, so an
/// unknown username costs the same as a wrong password. Same Argon2id
/// parameters as [`hash_password`]; no secret hashes to it.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$Y0ea1poJCyWCd+yPum+ZQQ$9BsFsWbfUBKtvJqx90jf4BcLrx0pjLe5Sn+/hT8xVkw";

/// Argon2 verifier over PHC strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Verifier;

impl CredentialVerifier for Argon2Verifier {
    fn verify(&self, stored: Option<&str>, submitted: &str) -> bool {
        match stored.and_then(|s| PasswordHash::new(s).ok()) {
            Some(parsed) => Argon2::default()
                .verify_password(submitted.as_bytes(), &parsed)
                .is_ok(),
            None => {
                // Burn the same work, then reject regardless of the outcome.
                if let Ok(dummy) = PasswordHash::new(DUMMY_HASH) {
                    let _ = Argon2::default().verify_password(submitted.as_bytes(), &dummy);
                }
                false
            }
        }
    }
}

/// Hash a plaintext password using Argon2id with a random salt.
///
/// Returns the PHC-formatted hash string (includes algorithm, params, salt, and hash).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default(); // Argon2id with default params
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
