//! Results and scoring for signed-in members

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use iview_common::db::Evaluation;

use crate::api::envelope::{ok, ApiJson, Envelope};
use crate::db::results::SessionResult;
use crate::error::ApiResult;
use crate::middleware::tenant::SessionUser;
use crate::services::evaluations::{self, EvaluationRequest};
use crate::services::results;
use crate::AppState;

pub async fn get_results(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): Path<(String, String)>,
) -> ApiResult<Json<Envelope<Vec<SessionResult>>>> {
    ok(results::sessions(&state, &member.tenant.id, &id).await?)
}

pub async fn export_results_csv(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    results::csv(&state, &member.tenant.id, &id).await
}

/// Members score as themselves; `reviewer_id` in the body is ignored
pub async fn upsert_evaluation(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): Path<(String, String)>,
    ApiJson(request): ApiJson<EvaluationRequest>,
) -> ApiResult<Json<Envelope<Evaluation>>> {
    member.require_reviewer()?;
    ok(evaluations::upsert(&state, &member.actor(), &id, &member.user.id, &request).await?)
}
