//! iview-server library interface
//!
//! Exposes [`AppState`] and [`build_router`] so integration tests can drive
//! the full HTTP surface against an in-memory database.

pub mod api;
pub mod audit;
pub mod conductor;
pub mod db;
pub mod error;
pub mod middleware;
pub mod pagination;
pub mod rate_limit;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use iview_common::config::ServiceConfig;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::conductor::ConductorClient;
use crate::rate_limit::ApiRateLimiter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<ServiceConfig>,
    /// Session token signing secret
    pub session_secret: Arc<str>,
    pub rate_limiter: Arc<ApiRateLimiter>,
    pub conductor: ConductorClient,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: ServiceConfig, session_secret: String) -> ApiResult<Self> {
        let conductor =
            ConductorClient::new(config.conductor_url.clone(), config.public_base_url.clone())
                .map_err(|e| ApiError::Internal(e.to_string()))?;
        let rate_limiter =
            ApiRateLimiter::new(config.rate_limit_per_minute, config.rate_limit_burst);

        Ok(Self {
            db,
            config: Arc::new(config),
            session_secret: Arc::from(session_secret),
            rate_limiter: Arc::new(rate_limiter),
            conductor,
            startup_time: Utc::now(),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::public_routes())
        .merge(api::app_routes(state.clone()))
        .merge(api::admin_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
