//! Signed session tokens for tenant users
//!
//! Token format: `base64url(claims_json) "." sha256_hex(payload "." secret)`.
//! The signature follows the same "content + shared secret, SHA-256, hex"
//! construction used for API keys; the secret never appears in the token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use super::{constant_time_eq, salted_sha256_hex};
use crate::db::models::Role;
use crate::Result;

/// Settings key holding the persisted signing secret
pub const SESSION_SECRET_KEY: &str = "session_secret";

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "iview_session";

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    /// Tenant id
    pub tid: String,
    pub role: Role,
    /// Expiry, unix seconds
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,
    #[error("session signature mismatch")]
    BadSignature,
    #[error("session expired")]
    Expired,
}

fn signature(payload: &str, secret: &str) -> String {
    // Salt slot carries the payload so the secret is appended last
    salted_sha256_hex(&format!("{}.", payload), secret)
}

/// Sign claims into a token
pub fn sign(claims: &SessionClaims, secret: &str) -> String {
    // Serializing a plain struct of strings and integers cannot fail
    let json = serde_json::to_vec(claims).unwrap_or_default();
    let payload = URL_SAFE_NO_PAD.encode(json);
    let sig = signature(&payload, secret);
    format!("{}.{}", payload, sig)
}

/// Verify a token and return its claims. `now` is unix seconds.
pub fn verify(
    token: &str,
    secret: &str,
    now: i64,
) -> std::result::Result<SessionClaims, SessionError> {
    let (payload, sig) = token.split_once('.').ok_or(SessionError::Malformed)?;

    let expected = signature(payload, secret);
    if !constant_time_eq(expected.as_bytes(), sig.as_bytes()) {
        return Err(SessionError::BadSignature);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| SessionError::Malformed)?;
    let claims: SessionClaims =
        serde_json::from_slice(&bytes).map_err(|_| SessionError::Malformed)?;

    if now >= claims.exp {
        return Err(SessionError::Expired);
    }

    Ok(claims)
}

/// Load the signing secret from settings, generating and storing one on first use
pub async fn load_or_create_session_secret(db: &SqlitePool) -> Result<String> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(SESSION_SECRET_KEY)
            .fetch_optional(db)
            .await?;

    if let Some((value,)) = existing {
        if !value.is_empty() {
            return Ok(value);
        }
    }

    let secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect();

    sqlx::query("INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, ?)")
        .bind(SESSION_SECRET_KEY)
        .bind(&secret)
        .bind(crate::time::now())
        .execute(db)
        .await?;

    info!("Generated new session signing secret");
    Ok(secret)
}
