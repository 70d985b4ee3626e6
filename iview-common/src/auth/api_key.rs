//! Admin API keys
//!
//! Keys have the shape `ivk_{prefix}_{secret}`. The prefix is stored in clear
//! and used for lookup; the secret is stored only as `sha256(salt || secret)`.
//! The plaintext key leaves the server exactly once, in the creation response.

use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;

use super::{constant_time_eq, random_salt, salted_sha256_hex};

/// Literal tag every key starts with
pub const KEY_TAG: &str = "ivk";
/// Length of the lookup prefix
pub const PREFIX_LEN: usize = 8;
/// Length of the secret part
pub const SECRET_LEN: usize = 32;

const PREFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Freshly minted key plus what gets persisted
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// Full key handed to the caller once
    pub plaintext: String,
    pub prefix: String,
    pub salt: String,
    pub hash: String,
}

/// Borrowed view of a presented key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedApiKey<'a> {
    pub prefix: &'a str,
    pub secret: &'a str,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiKeyError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed API key")]
    Malformed,
}

/// Generate a new random API key
pub fn generate_api_key() -> GeneratedApiKey {
    let mut rng = rand::thread_rng();
    let prefix: String = (0..PREFIX_LEN)
        .map(|_| PREFIX_ALPHABET[rng.gen_range(0..PREFIX_ALPHABET.len())] as char)
        .collect();
    let secret: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect();

    let salt = random_salt();
    let hash = salted_sha256_hex(&salt, &secret);

    GeneratedApiKey {
        plaintext: format!("{}_{}_{}", KEY_TAG, prefix, secret),
        prefix,
        salt,
        hash,
    }
}

/// Split a presented key into prefix and secret, validating the shape
pub fn parse_api_key(token: &str) -> Result<ParsedApiKey<'_>, ApiKeyError> {
    let mut parts = token.splitn(3, '_');
    let (Some(tag), Some(prefix), Some(secret)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ApiKeyError::Malformed);
    };

    if tag != KEY_TAG
        || prefix.len() != PREFIX_LEN
        || !prefix.bytes().all(|b| PREFIX_ALPHABET.contains(&b))
        || secret.len() != SECRET_LEN
        || !secret.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return Err(ApiKeyError::Malformed);
    }

    Ok(ParsedApiKey { prefix, secret })
}

/// Check a presented secret against the stored salt and hash
pub fn verify_secret(secret: &str, salt: &str, expected_hash: &str) -> bool {
    let calculated = salted_sha256_hex(salt, secret);
    constant_time_eq(calculated.as_bytes(), expected_hash.as_bytes())
}

/// Extract the token from an `Authorization: Bearer …` header value
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str, ApiKeyError> {
    let value = header_value.ok_or(ApiKeyError::MissingToken)?.trim();
    let (scheme, token) = value.split_once(' ').ok_or(ApiKeyError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiKeyError::Malformed);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiKeyError::MissingToken);
    }
    Ok(token)
}
