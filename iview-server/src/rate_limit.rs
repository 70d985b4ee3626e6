//! Per-API-key request quota
//!
//! One token bucket per key id: `per_minute` sustained, `burst` back-to-back.

use std::num::NonZeroU32;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use tracing::warn;

use crate::error::ApiError;
use crate::middleware::api_key::ApiPrincipal;
use crate::AppState;

pub struct ApiRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
}

impl ApiRateLimiter {
    /// Zero values are raised to one
    pub fn new(per_minute: u32, burst: u32) -> Self {
        let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute).allow_burst(burst)),
            clock: DefaultClock::default(),
        }
    }

    /// `Err(wait)` when `key` has exhausted its quota
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.limiter
            .check_key(&key.to_string())
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Drop buckets that have fully refilled
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}

/// Whole seconds to advertise in `retry-after`, never zero
pub fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

/// Runs after [`crate::middleware::api_key::require_api_key`]
pub async fn limit_per_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(key_id) = request
        .extensions()
        .get::<ApiPrincipal>()
        .map(|p| p.key_id.clone())
    else {
        return next.run(request).await;
    };

    match state.rate_limiter.check(&key_id) {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            warn!(key_id = %key_id, "Rate limit exceeded");
            ApiError::RateLimited {
                retry_after_secs: retry_after_secs(wait),
            }
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_limited() {
        let limiter = ApiRateLimiter::new(60, 3);
        for _ in 0..3 {
            assert!(limiter.check("k1").is_ok());
        }
        let wait = limiter.check("k1").unwrap_err();
        assert!(wait <= Duration::from_secs(1));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = ApiRateLimiter::new(60, 1);
        assert!(limiter.check("k1").is_ok());
        assert!(limiter.check("k1").is_err());
        assert!(limiter.check("k2").is_ok());
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(3)), 3);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }
}
