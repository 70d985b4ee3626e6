//! Audit log listing

use axum::{extract::State, Json};
use iview_common::auth::Scope;
use iview_common::db::AuditEntry;
use serde::Deserialize;

use crate::api::envelope::{ok, ApiQuery, Envelope};
use crate::db::audit::{self, AuditFilter};
use crate::error::ApiResult;
use crate::middleware::api_key::ApiPrincipal;
use crate::pagination::{calculate_pagination, Page};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub page: Option<i64>,
}

/// GET /api/admin/audit-log
pub async fn list_audit_log(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    ApiQuery(query): ApiQuery<AuditLogQuery>,
) -> ApiResult<Json<Envelope<Page<AuditEntry>>>> {
    principal.require(Scope::AuditRead)?;

    let filter = AuditFilter {
        action: query.action,
        resource_type: query.resource_type,
    };
    let total = audit::count(&state.db, &principal.tenant_id, &filter).await?;
    let pagination = calculate_pagination(total, query.page.unwrap_or(1));
    let items = audit::list(
        &state.db,
        &principal.tenant_id,
        &filter,
        pagination.page_size,
        pagination.offset,
    )
    .await?;

    ok(Page { items, pagination })
}
