//! Interview and question endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use iview_common::auth::Scope;
use iview_common::db::{Interview, Question};

use crate::api::envelope::{created, ok, ApiJson, ApiQuery, Envelope};
use crate::error::ApiResult;
use crate::middleware::api_key::ApiPrincipal;
use crate::pagination::Page;
use crate::services::interviews::{
    self, CreateInterviewRequest, InterviewDetail, ListInterviewsQuery, UpdateInterviewRequest,
};
use crate::services::questions::{
    self, CreateQuestionRequest, ReorderRequest, UpdateQuestionRequest,
};
use crate::AppState;

/// GET /api/admin/interviews
pub async fn list_interviews(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    ApiQuery(query): ApiQuery<ListInterviewsQuery>,
) -> ApiResult<Json<Envelope<Page<Interview>>>> {
    principal.require(Scope::InterviewsRead)?;
    ok(interviews::list(&state, &principal.tenant_id, &query).await?)
}

/// POST /api/admin/interviews
pub async fn create_interview(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    ApiJson(request): ApiJson<CreateInterviewRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Interview>>)> {
    principal.require(Scope::InterviewsWrite)?;
    created(interviews::create(&state, &principal.actor(), None, request).await?)
}

/// GET /api/admin/interviews/:id
pub async fn get_interview(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<InterviewDetail>>> {
    principal.require(Scope::InterviewsRead)?;
    ok(interviews::get(&state, &principal.tenant_id, &id).await?)
}

/// PATCH /api/admin/interviews/:id
pub async fn update_interview(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateInterviewRequest>,
) -> ApiResult<Json<Envelope<Interview>>> {
    principal.require(Scope::InterviewsWrite)?;
    ok(interviews::update(&state, &principal.actor(), &id, request).await?)
}

/// DELETE /api/admin/interviews/:id
pub async fn delete_interview(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    principal.require(Scope::InterviewsWrite)?;
    interviews::delete(&state, &principal.actor(), &id).await?;
    ok(serde_json::json!({ "deleted": id }))
}

/// GET /api/admin/interviews/:id/questions
pub async fn list_questions(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Vec<Question>>>> {
    principal.require(Scope::InterviewsRead)?;
    ok(questions::list(&state, &principal.tenant_id, &id).await?)
}

/// POST /api/admin/interviews/:id/questions
pub async fn add_question(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CreateQuestionRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Question>>)> {
    principal.require(Scope::InterviewsWrite)?;
    created(questions::append(&state, &principal.actor(), &id, request).await?)
}

/// PUT /api/admin/interviews/:id/questions/order
pub async fn reorder_questions(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> ApiResult<Json<Envelope<Vec<Question>>>> {
    principal.require(Scope::InterviewsWrite)?;
    ok(questions::reorder(&state, &principal.actor(), &id, request).await?)
}

/// PATCH /api/admin/questions/:id
pub async fn update_question(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateQuestionRequest>,
) -> ApiResult<Json<Envelope<Question>>> {
    principal.require(Scope::InterviewsWrite)?;
    ok(questions::update(&state, &principal.actor(), &id, request).await?)
}

/// DELETE /api/admin/questions/:id
pub async fn delete_question(
    State(state): State<AppState>,
    principal: ApiPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    principal.require(Scope::InterviewsWrite)?;
    questions::delete(&state, &principal.actor(), &id).await?;
    ok(serde_json::json!({ "deleted": id }))
}
