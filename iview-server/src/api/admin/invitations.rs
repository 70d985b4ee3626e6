//! Invitation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use iview_common::auth::Scope;
use iview_common::db::Invitation;

use crate::api::envelope::{created, ok, ApiJson, ApiQuery, Envelope};
use crate::error::ApiResult;
use crate::middleware::api_key::ApiPrincipal;
use crate::pagination::{Page, PageQuery};
use crate::services::invitations::{self, CreateInvitationRequest, InvitationView};
use crate::AppState;

/// GET /api/admin/interviews/:id/invitations
pub async fn list_invitations(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Envelope<Page<InvitationView>>>> {
    principal.require(Scope::InvitationsRead)?;
    ok(invitations::list(&state, &principal.tenant_id, &id, query).await?)
}

/// POST /api/admin/interviews/:id/invitations
pub async fn create_invitation(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<InvitationView>>)> {
    principal.require(Scope::InvitationsWrite)?;
    created(invitations::create(&state, &principal.actor(), &id, request).await?)
}

/// POST /api/admin/invitations/:id/revoke
pub async fn revoke_invitation(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Invitation>>> {
    principal.require(Scope::InvitationsWrite)?;
    ok(invitations::revoke(&state, &principal.actor(), &id).await?)
}
