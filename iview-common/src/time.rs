//! Timestamp utilities

use chrono::{DateTime, Duration, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Expiry instant `days` after `from`
pub fn expires_after_days(from: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    from + Duration::days(i64::from(days))
}

/// True once `now` has reached `expires_at`
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at
}
