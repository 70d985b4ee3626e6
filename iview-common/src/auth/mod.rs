//! Credential primitives
//!
//! Salted SHA-256 hashing for API keys and passwords, scope parsing, and
//! signed session tokens. Pure functions plus the settings-table lookup for the
//! session secret; HTTP wiring lives in the server crate.

pub mod api_key;
pub mod password;
pub mod scope;
pub mod session;

pub use api_key::{extract_bearer, generate_api_key, parse_api_key, ApiKeyError, GeneratedApiKey};
pub use password::{hash_password, validate_password, verify_password};
pub use scope::{Scope, ScopeSet};
pub use session::{load_or_create_session_secret, SessionClaims, SessionError};

use rand::RngCore;
use sha2::{Digest, Sha256};

/// SHA-256 of `salt || value` as 64 lowercase hex characters
pub fn salted_sha256_hex(salt: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Random 16-byte salt as 32 hex characters
pub fn random_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Byte comparison whose running time does not depend on where inputs differ
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
