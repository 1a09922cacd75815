//! Token hashing for user API tokens.
//!
//! Raw tokens are never stored; only the SHA-256 hex digest lands in the
//! database, so a leaked database does not leak usable credentials.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hash an API token for storage or lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a new random API token.
pub fn generate_token() -> String {
    format!(
        "sal_{}{}",
        Uuid::new_v4().as_simple(),
        Uuid::new_v4().as_simple()
    )
}
