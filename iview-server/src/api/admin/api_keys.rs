//! API key management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use iview_common::auth::{Scope, ScopeSet};
use iview_common::db::ApiKeyRecord;
use serde::Deserialize;
use serde_json::json;

use crate::api::envelope::{created, ok, required_text, ApiJson, ApiQuery, Envelope};
use crate::audit;
use crate::db::api_keys::{self, CreatedApiKey};
use crate::error::{ApiError, ApiResult};
use crate::middleware::api_key::ApiPrincipal;
use crate::pagination::{calculate_pagination, Page, PageQuery};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
    pub scopes: Vec<String>,
}

/// GET /api/admin/api-keys
pub async fn list_api_keys(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Envelope<Page<ApiKeyRecord>>>> {
    principal.require(Scope::KeysManage)?;

    let total = api_keys::count(&state.db, &principal.tenant_id).await?;
    let pagination = calculate_pagination(total, query.page);
    let items = api_keys::list(
        &state.db,
        &principal.tenant_id,
        pagination.page_size,
        pagination.offset,
    )
    .await?;

    ok(Page { items, pagination })
}

/// POST /api/admin/api-keys
///
/// The response carries the plaintext key; it cannot be retrieved again.
/// A key can only grant scopes its creator already holds, so `*` requires `*`.
pub async fn create_api_key(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    ApiJson(request): ApiJson<CreateApiKeyRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<CreatedApiKey>>)> {
    principal.require(Scope::KeysManage)?;

    let name = required_text("name", &request.name, 100)?;
    let scopes = ScopeSet::parse(&request.scopes.join(" ")).map_err(ApiError::Validation)?;
    if scopes.is_empty() {
        return Err(ApiError::Validation("at least one scope is required".to_string()));
    }
    if let Some(scope) = scopes.iter().find(|s| !principal.scopes.allows(**s)) {
        return Err(ApiError::Forbidden(format!(
            "cannot grant scope '{}' not held by this key",
            scope
        )));
    }

    let key = api_keys::create(&state.db, &principal.tenant_id, &name, &scopes).await?;
    audit::record(
        &state.db,
        &principal.actor(),
        "api_key.create",
        "api_key",
        Some(&key.record.id),
        Some(json!({ "name": key.record.name, "scopes": scopes })),
    )
    .await;

    created(key)
}

/// DELETE /api/admin/api-keys/:id
pub async fn revoke_api_key(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    principal.require(Scope::KeysManage)?;

    if !api_keys::revoke(&state.db, &principal.tenant_id, &id).await? {
        return Err(ApiError::NotFound(format!("API key {} not found", id)));
    }
    audit::record(&state.db, &principal.actor(), "api_key.revoke", "api_key", Some(&id), None)
        .await;

    ok(json!({ "revoked": id }))
}
