//! Question operations

use iview_common::db::{Question, QuestionKind};
use serde::Deserialize;
use serde_json::json;

use crate::api::envelope::{nullable, required_text};
use crate::audit::{self, Actor};
use crate::db::questions;
use crate::error::{ApiError, ApiResult};
use crate::services::interviews;
use crate::AppState;

pub const MAX_PROMPT_LEN: usize = 2000;
/// Two hours
pub const MAX_TIME_LIMIT_SECS: i64 = 7200;

#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub prompt: String,
    pub kind: Option<QuestionKind>,
    pub time_limit_secs: Option<i64>,
}

/// `"time_limit_secs": null` removes the limit; omitting it keeps the current one
#[derive(Debug, Default, Deserialize)]
pub struct UpdateQuestionRequest {
    pub prompt: Option<String>,
    pub kind: Option<QuestionKind>,
    #[serde(default, deserialize_with = "nullable")]
    pub time_limit_secs: Option<Option<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub question_ids: Vec<String>,
}

fn check_time_limit(value: Option<i64>) -> ApiResult<Option<i64>> {
    match value {
        Some(secs) if !(1..=MAX_TIME_LIMIT_SECS).contains(&secs) => {
            Err(ApiError::Validation(format!(
                "time_limit_secs must be between 1 and {}",
                MAX_TIME_LIMIT_SECS
            )))
        }
        other => Ok(other),
    }
}

pub async fn list(
    state: &AppState,
    tenant_id: &str,
    interview_id: &str,
) -> ApiResult<Vec<Question>> {
    interviews::require(state, tenant_id, interview_id).await?;
    Ok(questions::list(&state.db, tenant_id, interview_id).await?)
}

pub async fn append(
    state: &AppState,
    actor: &Actor,
    interview_id: &str,
    request: CreateQuestionRequest,
) -> ApiResult<Question> {
    interviews::require(state, &actor.tenant_id, interview_id).await?;

    let new = questions::NewQuestion {
        prompt: required_text("prompt", &request.prompt, MAX_PROMPT_LEN)?,
        kind: request.kind.unwrap_or(QuestionKind::Text),
        time_limit_secs: check_time_limit(request.time_limit_secs)?,
    };
    let question = questions::append(&state.db, &actor.tenant_id, interview_id, &new).await?;

    audit::record(
        &state.db,
        actor,
        "question.create",
        "question",
        Some(&question.id),
        Some(json!({ "interview_id": interview_id, "position": question.position })),
    )
    .await;
    Ok(question)
}

pub async fn update(
    state: &AppState,
    actor: &Actor,
    id: &str,
    request: UpdateQuestionRequest,
) -> ApiResult<Question> {
    let update = questions::QuestionUpdate {
        prompt: request
            .prompt
            .as_deref()
            .map(|p| required_text("prompt", p, MAX_PROMPT_LEN))
            .transpose()?,
        kind: request.kind,
        time_limit_secs: request.time_limit_secs.map(check_time_limit).transpose()?,
    };

    let question = questions::update(&state.db, &actor.tenant_id, id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("question {} not found", id)))?;

    audit::record(&state.db, actor, "question.update", "question", Some(id), None).await;
    Ok(question)
}

pub async fn delete(state: &AppState, actor: &Actor, id: &str) -> ApiResult<()> {
    let deleted = questions::delete_and_compact(&state.db, &actor.tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("question {} not found", id)))?;

    audit::record(
        &state.db,
        actor,
        "question.delete",
        "question",
        Some(id),
        Some(json!({ "interview_id": deleted.interview_id })),
    )
    .await;
    Ok(())
}

pub async fn reorder(
    state: &AppState,
    actor: &Actor,
    interview_id: &str,
    request: ReorderRequest,
) -> ApiResult<Vec<Question>> {
    interviews::require(state, &actor.tenant_id, interview_id).await?;
    let reordered =
        questions::reorder(&state.db, &actor.tenant_id, interview_id, &request.question_ids)
            .await?;

    audit::record(
        &state.db,
        actor,
        "question.reorder",
        "interview",
        Some(interview_id),
        Some(json!({ "question_ids": request.question_ids })),
    )
    .await;
    Ok(reordered)
}
