//! Invitation operations

use iview_common::config::MAX_INVITE_TTL_DAYS;
use iview_common::db::{Invitation, InterviewStatus};
use iview_common::time;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::envelope::{optional_text, validate_email};
use crate::audit::{self, Actor};
use crate::db::invitations;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, Page, PageQuery};
use crate::services::interviews;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub candidate_email: String,
    pub candidate_name: Option<String>,
    /// Defaults to the configured invitation lifetime
    pub expires_in_days: Option<u32>,
}

/// Invitation plus the link to send the candidate
#[derive(Debug, Serialize)]
pub struct InvitationView {
    #[serde(flatten)]
    pub invitation: Invitation,
    pub invite_url: String,
}

impl InvitationView {
    pub fn new(state: &AppState, invitation: Invitation) -> Self {
        let invite_url =
            format!("{}/interview/{}", state.config.public_base_url, invitation.token);
        Self { invitation, invite_url }
    }
}

pub async fn create(
    state: &AppState,
    actor: &Actor,
    interview_id: &str,
    request: CreateInvitationRequest,
) -> ApiResult<InvitationView> {
    let interview = interviews::require(state, &actor.tenant_id, interview_id).await?;
    if interview.status == InterviewStatus::Closed {
        return Err(ApiError::Conflict("interview is closed".to_string()));
    }

    let days = request.expires_in_days.unwrap_or(state.config.invite_ttl_days);
    if !(1..=MAX_INVITE_TTL_DAYS).contains(&days) {
        return Err(ApiError::Validation(format!(
            "expires_in_days must be between 1 and {}",
            MAX_INVITE_TTL_DAYS
        )));
    }

    let new = invitations::NewInvitation {
        candidate_email: validate_email(&request.candidate_email)?,
        candidate_name: optional_text("candidate_name", request.candidate_name.as_deref(), 200)?,
        expires_at: time::expires_after_days(time::now(), days),
    };
    let invitation = invitations::create(&state.db, &actor.tenant_id, interview_id, &new).await?;

    audit::record(
        &state.db,
        actor,
        "invitation.create",
        "invitation",
        Some(&invitation.id),
        Some(json!({
            "interview_id": interview_id,
            "candidate_email": invitation.candidate_email,
        })),
    )
    .await;
    Ok(InvitationView::new(state, invitation))
}

pub async fn list(
    state: &AppState,
    tenant_id: &str,
    interview_id: &str,
    query: PageQuery,
) -> ApiResult<Page<InvitationView>> {
    interviews::require(state, tenant_id, interview_id).await?;

    let total = invitations::count_for_interview(&state.db, tenant_id, interview_id).await?;
    let pagination = calculate_pagination(total, query.page);
    let items = invitations::list_for_interview(
        &state.db,
        tenant_id,
        interview_id,
        pagination.page_size,
        pagination.offset,
    )
    .await?
    .into_iter()
    .map(|inv| InvitationView::new(state, inv))
    .collect();

    Ok(Page { items, pagination })
}

pub async fn revoke(state: &AppState, actor: &Actor, id: &str) -> ApiResult<Invitation> {
    let (invitation, changed) = invitations::revoke(&state.db, &actor.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("invitation {} not found", id)))?;

    if !changed {
        return Err(ApiError::Conflict(format!(
            "invitation is already {}",
            invitation.status
        )));
    }

    audit::record(&state.db, actor, "invitation.revoke", "invitation", Some(id), None).await;
    Ok(invitation)
}
