//! Results, CSV export and evaluations

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use iview_common::auth::Scope;
use iview_common::db::Evaluation;

use crate::api::envelope::{ok, ApiJson, Envelope};
use crate::db::results::SessionResult;
use crate::error::{ApiError, ApiResult};
use crate::middleware::api_key::ApiPrincipal;
use crate::services::evaluations::{self, EvaluationRequest};
use crate::services::results;
use crate::AppState;

/// GET /api/admin/interviews/:id/results
pub async fn get_results(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Vec<SessionResult>>>> {
    principal.require(Scope::ResultsRead)?;
    ok(results::sessions(&state, &principal.tenant_id, &id).await?)
}

/// GET /api/admin/interviews/:id/results.csv
pub async fn export_results_csv(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    principal.require(Scope::ResultsRead)?;
    results::csv(&state, &principal.tenant_id, &id).await
}

/// POST /api/admin/responses/:id/evaluations
pub async fn upsert_evaluation(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<EvaluationRequest>,
) -> ApiResult<Json<Envelope<Evaluation>>> {
    principal.require(Scope::EvaluationsWrite)?;
    let reviewer_id = request
        .reviewer_id
        .clone()
        .ok_or_else(|| ApiError::Validation("reviewer_id is required".to_string()))?;
    ok(evaluations::upsert(&state, &principal.actor(), &id, &reviewer_id, &request).await?)
}
