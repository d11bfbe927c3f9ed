//! Short code generation and custom alias validation.
//!
//! Generation is stateless and makes no uniqueness guarantee by itself;
//! uniqueness is enforced by the caller via retry-on-conflict against the
//! store's unique constraints.

use crate::error::LinkError;
use rand::Rng;

/// Fixed alphabet for generated codes: ASCII letters and digits.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Default length of generated short codes.
pub const DEFAULT_CODE_LENGTH: usize = 12;

/// Maximum accepted custom alias length (store varchar bound).
const MAX_ALIAS_LENGTH: usize = 64;

/// Generates a random alphanumeric short code of the given length.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Validates a caller-supplied custom alias.
///
/// Aliases must be non-empty, at most 64 characters, and ASCII alphanumeric.
///
/// # Errors
///
/// Returns [`LinkError::InvalidAlias`] when any rule is violated.
pub fn validate_alias(alias: &str) -> Result<(), LinkError> {
    if alias.is_empty() || alias.len() > MAX_ALIAS_LENGTH {
        return Err(LinkError::InvalidAlias(alias.to_string()));
    }

    if !alias.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LinkError::InvalidAlias(alias.to_string()));
    }

    Ok(())
}
