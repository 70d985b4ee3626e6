//! Scoring candidate responses

use iview_common::db::Evaluation;
use serde::Deserialize;
use serde_json::json;

use crate::api::envelope::optional_text;
use crate::audit::{self, Actor};
use crate::db::{evaluations, sessions, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const MAX_NOTES_LEN: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct EvaluationRequest {
    pub score: i64,
    pub notes: Option<String>,
    /// Required on the admin API; the tenant app uses the signed-in user
    pub reviewer_id: Option<String>,
}

/// Upsert `reviewer_id`'s score for a response. The reviewer must be an
/// `hr` or `admin` member of the actor's tenant.
pub async fn upsert(
    state: &AppState,
    actor: &Actor,
    response_id: &str,
    reviewer_id: &str,
    request: &EvaluationRequest,
) -> ApiResult<Evaluation> {
    let reviewer = users::find(&state.db, &actor.tenant_id, reviewer_id)
        .await?
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "reviewer {} is not a member of this tenant",
                reviewer_id
            ))
        })?;
    if !reviewer.role.can_review() {
        return Err(ApiError::Forbidden(format!(
            "role '{}' may not evaluate responses",
            reviewer.role
        )));
    }

    sessions::find_response(&state.db, &actor.tenant_id, response_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("response {} not found", response_id)))?;

    let notes = optional_text("notes", request.notes.as_deref(), MAX_NOTES_LEN)?;
    let evaluation = evaluations::upsert(
        &state.db,
        &actor.tenant_id,
        response_id,
        &reviewer.id,
        request.score,
        notes.as_deref(),
    )
    .await?;

    audit::record(
        &state.db,
        actor,
        "evaluation.upsert",
        "response",
        Some(response_id),
        Some(json!({ "reviewer_id": reviewer.id, "score": evaluation.score })),
    )
    .await;
    Ok(evaluation)
}
