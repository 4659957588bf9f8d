//! Session token minting.
//!
//! Tokens are opaque bearer credentials: 64 characters drawn uniformly from the
//! 62-symbol alphanumeric alphabet (about 381 bits of entropy) using the
//! thread-local CSPRNG.

use rand::Rng;

/// Length of every issued session token.
pub const SESSION_TOKEN_LENGTH: usize = 64;

/// Default session lifetime in days.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Generate a new random session token.
pub fn generate_session_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(SESSION_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Whether `token` has the shape of an issued token.
///
/// Anything else cannot match a stored session, so callers may reject it
/// without a store round trip.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == SESSION_TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Shorten a token for log output. Never log a full token.
pub fn redact(token: &str) -> String {
    let visible: String = token.chars().take(6).collect();
    format!("{visible}…")
}
