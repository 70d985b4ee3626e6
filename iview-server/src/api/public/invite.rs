//! Candidate flow: resolve an invitation, start, answer, complete
//!
//! The invitation token and then the session id are the candidate's only
//! credentials. Tenant scoping comes from the invitation row itself.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use iview_common::db::{
    CandidateResponse, Invitation, InvitationStatus, Interview, InterviewSession, InterviewStatus,
    QuestionKind, SessionStatus,
};
use iview_common::time;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::theme::TenantTheme;
use crate::api::envelope::{created, ok, optional_text, ApiJson, Envelope};
use crate::audit::{self, Actor};
use crate::db::{interviews, invitations, questions, sessions, tenants};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const MAX_ANSWER_LEN: usize = 20_000;

#[derive(Debug, Serialize)]
pub struct InvitationSummary {
    pub interview_id: String,
    pub title: String,
    pub job_title: Option<String>,
    pub description: Option<String>,
    pub candidate_name: Option<String>,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub question_count: usize,
    pub theme: TenantTheme,
}

#[derive(Debug, Serialize)]
pub struct CandidateQuestion {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    pub time_limit_secs: Option<i64>,
    pub position: i64,
}

#[derive(Debug, Serialize)]
pub struct StartedSession {
    pub session_id: String,
    pub conductor_session_url: String,
    pub questions: Vec<CandidateQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponseRequest {
    pub question_id: String,
    pub answer_text: Option<String>,
    pub media_url: Option<String>,
}

/// Invitation and its interview, provided the invitation may be used.
/// Used invitations resolve here; starting one is refused separately.
async fn resolve(state: &AppState, token: &str) -> ApiResult<(Invitation, Interview)> {
    let invitation = invitations::find_by_token(&state.db, token)
        .await?
        .ok_or_else(|| ApiError::NotFound("invitation not found".to_string()))?;

    if invitation.status == InvitationStatus::Revoked {
        return Err(ApiError::Forbidden("invitation revoked".to_string()));
    }
    if time::is_expired(invitation.expires_at, time::now()) {
        return Err(ApiError::Forbidden("invitation expired".to_string()));
    }

    let interview = interviews::find_any(&state.db, &invitation.interview_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("interview not found".to_string()))?;
    if interview.status != InterviewStatus::Active {
        return Err(ApiError::Conflict("interview is not accepting candidates".to_string()));
    }

    Ok((invitation, interview))
}

async fn candidate_questions(
    state: &AppState,
    interview: &Interview,
) -> ApiResult<Vec<CandidateQuestion>> {
    let questions = questions::list(&state.db, &interview.tenant_id, &interview.id).await?;
    Ok(questions
        .into_iter()
        .map(|q| CandidateQuestion {
            id: q.id,
            prompt: q.prompt,
            kind: q.kind,
            time_limit_secs: q.time_limit_secs,
            position: q.position,
        })
        .collect())
}

/// GET /api/invite/:token
pub async fn get_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<Envelope<InvitationSummary>>> {
    let (invitation, interview) = resolve(&state, &token).await?;

    let tenant = tenants::find_by_id(&state.db, &interview.tenant_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("tenant {} missing", interview.tenant_id)))?;
    let question_count = questions::list(&state.db, &interview.tenant_id, &interview.id)
        .await?
        .len();

    ok(InvitationSummary {
        interview_id: interview.id,
        title: interview.title,
        job_title: interview.job_title,
        description: interview.description,
        candidate_name: invitation.candidate_name,
        status: invitation.status,
        expires_at: invitation.expires_at,
        question_count,
        theme: TenantTheme::from(&tenant),
    })
}

/// POST /api/invite/:token/start
pub async fn start_interview(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<(StatusCode, Json<Envelope<StartedSession>>)> {
    let (invitation, interview) = resolve(&state, &token).await?;
    if invitation.status != InvitationStatus::Pending {
        return Err(ApiError::Conflict("invitation has already been used".to_string()));
    }

    let session = sessions::start(&state.db, &invitation).await?;
    let conductor_session_url = state
        .conductor
        .register_session(&session.id, &interview.id, &invitation.token)
        .await;
    sessions::set_conductor_url(&state.db, &session.id, &conductor_session_url).await?;

    info!(session_id = %session.id, interview_id = %interview.id, "Interview session started");
    audit::record(
        &state.db,
        &Actor::system(&invitation.tenant_id),
        "session.start",
        "session",
        Some(&session.id),
        Some(json!({ "invitation_id": invitation.id, "interview_id": interview.id })),
    )
    .await;

    created(StartedSession {
        session_id: session.id,
        conductor_session_url,
        questions: candidate_questions(&state, &interview).await?,
    })
}

async fn require_open_session(state: &AppState, id: &str) -> ApiResult<InterviewSession> {
    let session = sessions::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("session {} not found", id)))?;
    if session.status != SessionStatus::InProgress {
        return Err(ApiError::Conflict("session is already completed".to_string()));
    }
    Ok(session)
}

/// POST /api/sessions/:id/responses
pub async fn submit_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SubmitResponseRequest>,
) -> ApiResult<Json<Envelope<CandidateResponse>>> {
    let session = require_open_session(&state, &id).await?;

    let question = questions::find(&state.db, &session.tenant_id, &request.question_id)
        .await?
        .filter(|q| q.interview_id == session.interview_id)
        .ok_or_else(|| {
            ApiError::Validation("question does not belong to this interview".to_string())
        })?;

    let answer_text = optional_text("answer_text", request.answer_text.as_deref(), MAX_ANSWER_LEN)?;
    let media_url = optional_text("media_url", request.media_url.as_deref(), 2048)?;
    if answer_text.is_none() && media_url.is_none() {
        return Err(ApiError::Validation(
            "answer_text or media_url is required".to_string(),
        ));
    }

    let response = sessions::upsert_response(
        &state.db,
        &session,
        &question.id,
        answer_text.as_deref(),
        media_url.as_deref(),
    )
    .await?;

    audit::record(
        &state.db,
        &Actor::system(&session.tenant_id),
        "response.submit",
        "response",
        Some(&response.id),
        Some(json!({ "session_id": session.id, "question_id": question.id })),
    )
    .await;
    ok(response)
}

/// POST /api/sessions/:id/complete
pub async fn complete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<InterviewSession>>> {
    require_open_session(&state, &id).await?;

    let session = sessions::complete(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::Conflict("session is already completed".to_string()))?;

    info!(session_id = %session.id, "Interview session completed");
    audit::record(
        &state.db,
        &Actor::system(&session.tenant_id),
        "session.complete",
        "session",
        Some(&session.id),
        None,
    )
    .await;
    ok(session)
}
