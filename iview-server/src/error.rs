//! API error type and its HTTP mapping
//!
//! Every handler returns [`ApiResult`]. Failures render as the uniform
//! envelope `{"success": false, "error": {"code", "message"}}` with a fixed
//! code per status.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request syntax (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// State conflict, e.g. invitation already used (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Well-formed but semantically invalid input (422)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Per-key quota exhausted (429)
    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Database failure (500); detail is logged, not returned
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Error half of the response envelope
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the client
    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg) => msg.clone(),
            ApiError::RateLimited { retry_after_secs } => {
                format!("Rate limit exceeded, retry in {}s", retry_after_secs)
            }
            ApiError::Database(_) => "A database error occurred".to_string(),
            ApiError::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.public_message(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return ApiError::Conflict("Record already exists".to_string());
            }
            if db_err.is_check_violation() {
                return ApiError::Validation("Value violates a constraint".to_string());
            }
        }
        ApiError::Database(err)
    }
}

impl From<iview_common::Error> for ApiError {
    fn from(err: iview_common::Error) -> Self {
        use iview_common::Error as E;
        match err {
            E::Database(e) => ApiError::from(e),
            E::NotFound(msg) => ApiError::NotFound(msg),
            E::InvalidInput(msg) => ApiError::Validation(msg),
            E::Conflict(msg) => ApiError::Conflict(msg),
            E::Io(e) => ApiError::Internal(e.to_string()),
            E::Csv(e) => ApiError::Internal(e.to_string()),
            E::Config(msg) | E::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(e) => error!("Database error: {}", e),
            ApiError::Internal(msg) => error!("Internal error: {}", msg),
            _ => {}
        }

        let status = self.status();
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.body(),
        }));

        let mut response = (status, body).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
