//! Sign-in, sign-out, current user and the access query

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use iview_common::access::AccessState;
use iview_common::auth::{session, verify_password, SessionClaims};
use iview_common::db::{Role, Tenant};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::envelope::{ok, ApiJson, ApiQuery, Envelope};
use crate::db::{tenants, users};
use crate::error::{ApiError, ApiResult};
use crate::middleware::tenant::{clear_session_cookie, decide, session_cookie, SessionUser};
use crate::AppState;

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TenantSummary {
    pub id: String,
    pub slug: String,
    pub name: String,
}

impl From<&Tenant> for TenantSummary {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id.clone(),
            slug: tenant.slug.clone(),
            name: tenant.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub tenant: TenantSummary,
}

impl From<&SessionUser> for MeResponse {
    fn from(session_user: &SessionUser) -> Self {
        Self {
            id: session_user.user.id.clone(),
            email: session_user.user.email.clone(),
            display_name: session_user.user.display_name.clone(),
            role: session_user.user.role,
            tenant: TenantSummary::from(&session_user.tenant),
        }
    }
}

/// POST /t/:slug/auth/login
pub async fn login(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let tenant = tenants::find_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("tenant '{}' not found", slug)))?;

    // Unknown email and wrong password are indistinguishable to the caller
    let user = users::find_by_email(&state.db, &tenant.id, &request.email).await?;
    let user = match user {
        Some(user)
            if verify_password(&request.password, &user.password_salt, &user.password_hash) =>
        {
            user
        }
        _ => {
            warn!(tenant = %slug, "Failed sign-in attempt");
            return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }
    };

    let ttl_secs = i64::from(state.config.session_ttl_hours) * 3600;
    let claims = SessionClaims {
        sub: user.id.clone(),
        tid: tenant.id.clone(),
        role: user.role,
        exp: Utc::now().timestamp() + ttl_secs,
    };
    let token = session::sign(&claims, &state.session_secret);

    info!(tenant = %slug, user_id = %user.id, "User signed in");

    let session_user = SessionUser { user, tenant };
    let body = Json(Envelope {
        success: true,
        data: MeResponse::from(&session_user),
    });
    Ok(([(header::SET_COOKIE, session_cookie(&token, ttl_secs))], body).into_response())
}

/// POST /t/:slug/auth/logout
pub async fn logout() -> Response {
    let body = Json(Envelope {
        success: true,
        data: serde_json::json!({ "signed_out": true }),
    });
    ([(header::SET_COOKIE, clear_session_cookie())], body).into_response()
}

/// GET /t/:slug/app/me
pub async fn me(session_user: SessionUser) -> ApiResult<Json<Envelope<MeResponse>>> {
    ok(MeResponse::from(&session_user))
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub path: Option<String>,
}

/// GET /t/:slug/access?path=/t/:slug/app/...
///
/// Reports what the access middleware would do for `path` (default: the app
/// home) with the caller's cookie.
pub async fn access(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<AccessQuery>,
) -> ApiResult<Json<Envelope<AccessState>>> {
    let prefix = format!("/t/{}", slug);
    let path = query.path.unwrap_or_else(|| format!("{}/app", prefix));
    if path != prefix && !path.starts_with(&format!("{}/", prefix)) {
        return Err(ApiError::Validation(format!("path must be inside {}", prefix)));
    }

    let (decision, _) = decide(&state, &path, &headers).await?;
    ok(decision)
}
