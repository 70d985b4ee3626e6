//! Interview operations

use iview_common::db::{Interview, InterviewStatus, Question};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::envelope::{nullable, optional_text, patch_text, required_text};
use crate::audit::{self, Actor};
use crate::db::{interviews, questions};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, Page};
use crate::AppState;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
    pub title: String,
    pub description: Option<String>,
    pub job_title: Option<String>,
    #[serde(default)]
    pub status: Option<InterviewStatus>,
}

/// Omitted fields are left alone; `null` or `""` clears description and job title
#[derive(Debug, Default, Deserialize)]
pub struct UpdateInterviewRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub job_title: Option<Option<String>>,
    pub status: Option<InterviewStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ListInterviewsQuery {
    pub status: Option<InterviewStatus>,
    #[serde(default = "first_page")]
    pub page: i64,
}

fn first_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct InterviewDetail {
    #[serde(flatten)]
    pub interview: Interview,
    pub questions: Vec<Question>,
}

/// The interview, or `NOT_FOUND` if it is missing or belongs to another tenant
pub async fn require(state: &AppState, tenant_id: &str, id: &str) -> ApiResult<Interview> {
    interviews::find(&state.db, tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("interview {} not found", id)))
}

pub async fn list(
    state: &AppState,
    tenant_id: &str,
    query: &ListInterviewsQuery,
) -> ApiResult<Page<Interview>> {
    let total = interviews::count(&state.db, tenant_id, query.status).await?;
    let pagination = calculate_pagination(total, query.page);
    let items = interviews::list(
        &state.db,
        tenant_id,
        query.status,
        pagination.page_size,
        pagination.offset,
    )
    .await?;
    Ok(Page { items, pagination })
}

pub async fn get(state: &AppState, tenant_id: &str, id: &str) -> ApiResult<InterviewDetail> {
    let interview = require(state, tenant_id, id).await?;
    let questions = questions::list(&state.db, tenant_id, id).await?;
    Ok(InterviewDetail { interview, questions })
}

pub async fn create(
    state: &AppState,
    actor: &Actor,
    created_by: Option<&str>,
    request: CreateInterviewRequest,
) -> ApiResult<Interview> {
    let new = interviews::NewInterview {
        title: required_text("title", &request.title, MAX_TITLE_LEN)?,
        description: optional_text(
            "description",
            request.description.as_deref(),
            MAX_DESCRIPTION_LEN,
        )?,
        job_title: optional_text("job_title", request.job_title.as_deref(), MAX_TITLE_LEN)?,
        status: request.status.unwrap_or(InterviewStatus::Draft),
        created_by: created_by.map(str::to_string),
    };

    let interview = interviews::create(&state.db, &actor.tenant_id, &new).await?;
    audit::record(
        &state.db,
        actor,
        "interview.create",
        "interview",
        Some(&interview.id),
        Some(json!({ "title": interview.title, "status": interview.status })),
    )
    .await;
    Ok(interview)
}

pub async fn update(
    state: &AppState,
    actor: &Actor,
    id: &str,
    request: UpdateInterviewRequest,
) -> ApiResult<Interview> {
    let update = interviews::InterviewUpdate {
        title: request
            .title
            .as_deref()
            .map(|t| required_text("title", t, MAX_TITLE_LEN))
            .transpose()?,
        description: patch_text("description", request.description, MAX_DESCRIPTION_LEN)?,
        job_title: patch_text("job_title", request.job_title, MAX_TITLE_LEN)?,
        status: request.status,
    };

    let interview = interviews::update(&state.db, &actor.tenant_id, id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("interview {} not found", id)))?;

    audit::record(
        &state.db,
        actor,
        "interview.update",
        "interview",
        Some(id),
        Some(json!({ "status": interview.status })),
    )
    .await;
    Ok(interview)
}

pub async fn delete(state: &AppState, actor: &Actor, id: &str) -> ApiResult<()> {
    if !interviews::delete(&state.db, &actor.tenant_id, id).await? {
        return Err(ApiError::NotFound(format!("interview {} not found", id)));
    }
    audit::record(&state.db, actor, "interview.delete", "interview", Some(id), None).await;
    Ok(())
}
