//! Interview results as JSON or CSV

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use iview_common::export::{interview_results_csv, results_filename};

use crate::db::results::{self, SessionResult};
use crate::error::{ApiError, ApiResult};
use crate::services::interviews;
use crate::AppState;

pub async fn sessions(
    state: &AppState,
    tenant_id: &str,
    interview_id: &str,
) -> ApiResult<Vec<SessionResult>> {
    interviews::require(state, tenant_id, interview_id).await?;
    let rows = results::rows(&state.db, tenant_id, interview_id).await?;
    Ok(results::group_by_session(rows))
}

/// `text/csv` attachment
pub async fn csv(state: &AppState, tenant_id: &str, interview_id: &str) -> ApiResult<Response> {
    interviews::require(state, tenant_id, interview_id).await?;
    let rows = results::rows(&state.db, tenant_id, interview_id).await?;
    let body = interview_results_csv(&rows)?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        results_filename(interview_id)
    ))
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
