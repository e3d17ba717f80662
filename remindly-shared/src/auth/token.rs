//! Email confirmation tokens
//!
//! A token is 32 bytes from the OS-seeded thread RNG, hex encoded (64
//! characters, URL safe). Only its SHA-256 digest is persisted, so a leaked
//! `pending_registrations` table cannot be used to confirm anybody's address.
//!
//! ```
//! use remindly_shared::auth::token::{generate_confirmation_token, hash_confirmation_token};
//!
//! let token = generate_confirmation_token();
//! assert_eq!(token.len(), 64);
//! assert_eq!(hash_confirmation_token(&token), hash_confirmation_token(&token));
//! ```

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes per token
const TOKEN_BYTES: usize = 32;

/// Length of an encoded token
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Generates a fresh confirmation token
pub fn generate_confirmation_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 hex digest of a token, the form stored in the database
pub fn hash_confirmation_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
