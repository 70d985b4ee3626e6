//! Interview, question and invitation actions for signed-in members

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use iview_common::db::{Interview, Question};

use crate::api::envelope::{created, ok, ApiJson, ApiQuery, Envelope};
use crate::error::ApiResult;
use crate::middleware::tenant::SessionUser;
use crate::pagination::{Page, PageQuery};
use crate::services::interviews::{
    self, CreateInterviewRequest, InterviewDetail, ListInterviewsQuery, UpdateInterviewRequest,
};
use crate::services::invitations::{self, CreateInvitationRequest, InvitationView};
use crate::services::questions::{
    self, CreateQuestionRequest, ReorderRequest, UpdateQuestionRequest,
};
use crate::AppState;

type SlugAndId = Path<(String, String)>;

pub async fn list_interviews(
    State(state): State<AppState>,
    member: SessionUser,
    ApiQuery(query): ApiQuery<ListInterviewsQuery>,
) -> ApiResult<Json<Envelope<Page<Interview>>>> {
    ok(interviews::list(&state, &member.tenant.id, &query).await?)
}

pub async fn create_interview(
    State(state): State<AppState>,
    member: SessionUser,
    ApiJson(request): ApiJson<CreateInterviewRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Interview>>)> {
    created(interviews::create(&state, &member.actor(), Some(&member.user.id), request).await?)
}

pub async fn get_interview(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): SlugAndId,
) -> ApiResult<Json<Envelope<InterviewDetail>>> {
    ok(interviews::get(&state, &member.tenant.id, &id).await?)
}

pub async fn update_interview(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): SlugAndId,
    ApiJson(request): ApiJson<UpdateInterviewRequest>,
) -> ApiResult<Json<Envelope<Interview>>> {
    ok(interviews::update(&state, &member.actor(), &id, request).await?)
}

pub async fn delete_interview(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): SlugAndId,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    interviews::delete(&state, &member.actor(), &id).await?;
    ok(serde_json::json!({ "deleted": id }))
}

pub async fn list_questions(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): SlugAndId,
) -> ApiResult<Json<Envelope<Vec<Question>>>> {
    ok(questions::list(&state, &member.tenant.id, &id).await?)
}

pub async fn add_question(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): SlugAndId,
    ApiJson(request): ApiJson<CreateQuestionRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Question>>)> {
    created(questions::append(&state, &member.actor(), &id, request).await?)
}

pub async fn reorder_questions(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): SlugAndId,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> ApiResult<Json<Envelope<Vec<Question>>>> {
    ok(questions::reorder(&state, &member.actor(), &id, request).await?)
}

pub async fn update_question(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): SlugAndId,
    ApiJson(request): ApiJson<UpdateQuestionRequest>,
) -> ApiResult<Json<Envelope<Question>>> {
    ok(questions::update(&state, &member.actor(), &id, request).await?)
}

pub async fn delete_question(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): SlugAndId,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    questions::delete(&state, &member.actor(), &id).await?;
    ok(serde_json::json!({ "deleted": id }))
}

pub async fn list_invitations(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): SlugAndId,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Envelope<Page<InvitationView>>>> {
    ok(invitations::list(&state, &member.tenant.id, &id, query).await?)
}

pub async fn create_invitation(
    State(state): State<AppState>,
    member: SessionUser,
    Path((_, id)): SlugAndId,
    ApiJson(request): ApiJson<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<InvitationView>>)> {
    created(invitations::create(&state, &member.actor(), &id, request).await?)
}
