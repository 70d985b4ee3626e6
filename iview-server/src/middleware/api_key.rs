//! Bearer API-key authentication for `/api/admin`
//!
//! A verified key becomes an [`ApiPrincipal`] request extension. Handlers
//! extract it and call [`ApiPrincipal::require`] with the scope their route
//! needs.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use iview_common::auth::{api_key::verify_secret, extract_bearer, parse_api_key, Scope, ScopeSet};
use tracing::{debug, warn};

use crate::audit::Actor;
use crate::db::api_keys;
use crate::error::ApiError;
use crate::AppState;

/// Authenticated API key
#[derive(Debug, Clone)]
pub struct ApiPrincipal {
    pub key_id: String,
    pub tenant_id: String,
    pub scopes: ScopeSet,
}

impl ApiPrincipal {
    pub fn require(&self, scope: Scope) -> Result<(), ApiError> {
        if self.scopes.allows(scope) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("API key lacks scope '{}'", scope)))
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::api_key(&self.tenant_id, &self.key_id)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ApiPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ApiPrincipal>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("API key required".to_string()))
    }
}

const INVALID_KEY: &str = "Invalid API key";

/// Resolve the bearer token to an active key
async fn authenticate(
    state: &AppState,
    header_value: Option<&str>,
) -> Result<ApiPrincipal, ApiError> {
    let token = extract_bearer(header_value).map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    let parsed = parse_api_key(token).map_err(|_| ApiError::Unauthorized(INVALID_KEY.to_string()))?;

    let record = api_keys::find_by_prefix(&state.db, parsed.prefix)
        .await?
        .ok_or_else(|| {
            warn!(prefix = %parsed.prefix, "Unknown API key prefix");
            ApiError::Unauthorized(INVALID_KEY.to_string())
        })?;

    if record.revoked_at.is_some() {
        warn!(key_id = %record.id, "Revoked API key presented");
        return Err(ApiError::Unauthorized(INVALID_KEY.to_string()));
    }

    if !verify_secret(parsed.secret, &record.salt, &record.key_hash) {
        warn!(key_id = %record.id, "API key secret mismatch");
        return Err(ApiError::Unauthorized(INVALID_KEY.to_string()));
    }

    // Stored scopes were validated on write; an unparseable value grants nothing
    let scopes = ScopeSet::parse(&record.scopes).unwrap_or_else(|e| {
        warn!(key_id = %record.id, "Stored scopes unreadable: {}", e);
        ScopeSet::default()
    });

    if let Err(e) = api_keys::touch_last_used(&state.db, &record.id).await {
        debug!(key_id = %record.id, "Could not update last_used_at: {}", e);
    }

    Ok(ApiPrincipal {
        key_id: record.id,
        tenant_id: record.tenant_id,
        scopes,
    })
}

pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match authenticate(&state, header_value).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
