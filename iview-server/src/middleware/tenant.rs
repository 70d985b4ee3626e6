//! Tenant app routes: session cookie plus the route-access decision
//!
//! `/t/:slug/app/...` requests pass through [`require_tenant_access`]. It
//! resolves the tenant from the path, verifies the `iview_session` cookie,
//! and asks [`resolve_access_state`] whether to continue. A redirect becomes
//! `303 See Other` with the target in both `location` and the JSON body.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use iview_common::access::{
    classify_tenant_path, resolve_access_state, AccessInputs, AccessState, RedirectReason,
};
use iview_common::auth::session::{self, SessionClaims, SESSION_COOKIE};
use iview_common::db::{Role, Tenant, User};
use tracing::debug;

use crate::audit::Actor;
use crate::db::{tenants, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Signed-in member of the tenant named in the path
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user: User,
    pub tenant: Tenant,
}

impl SessionUser {
    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn actor(&self) -> Actor {
        Actor::user(&self.tenant.id, &self.user.id)
    }

    /// Scoring responses is limited to reviewers
    pub fn require_reviewer(&self) -> ApiResult<()> {
        if self.user.role.can_review() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "role '{}' may not evaluate responses",
                self.user.role
            )))
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("sign-in required".to_string()))
    }
}

/// Value of one cookie from the `cookie` header(s)
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// `set-cookie` value establishing a session
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// `set-cookie` value clearing the session
pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

/// Split `/t/{slug}{rest}` into slug and rest
pub fn split_tenant_path(path: &str) -> Option<(&str, &str)> {
    let after = path.strip_prefix("/t/")?;
    let (slug, rest) = match after.find('/') {
        Some(i) => (&after[..i], &after[i..]),
        None => (after, ""),
    };
    (!slug.is_empty()).then_some((slug, rest))
}

/// Verified session claims, or `None` for a missing, forged or expired cookie
pub fn session_claims(state: &AppState, headers: &HeaderMap) -> Option<SessionClaims> {
    let token = cookie_value(headers, SESSION_COOKIE)?;
    match session::verify(token, &state.session_secret, chrono::Utc::now().timestamp()) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!("Ignoring session cookie: {}", e);
            None
        }
    }
}

/// Full access decision for `path`, plus the member when access is granted
pub async fn decide(
    state: &AppState,
    path: &str,
    headers: &HeaderMap,
) -> ApiResult<(AccessState, Option<SessionUser>)> {
    let Some((slug, rest)) = split_tenant_path(path) else {
        return Ok((AccessState::TenantNotFound, None));
    };
    let Some(tenant) = tenants::find_by_slug(&state.db, slug).await? else {
        return Ok((resolve_access_state(None, path, AccessInputs::default()), None));
    };

    // A session counts only while its user still exists
    let mut member = None;
    let mut is_authenticated = false;
    if let Some(claims) = session_claims(state, headers) {
        if let Some(user) = users::find(&state.db, &claims.tid, &claims.sub).await? {
            is_authenticated = true;
            if user.tenant_id == tenant.id {
                member = Some(user);
            }
        }
    }

    let (is_public_route, is_auth_route) = classify_tenant_path(rest);
    let inputs = AccessInputs {
        is_public_route,
        is_auth_route,
        is_authenticated,
        has_tenant_access: member.is_some(),
    };

    let decision = resolve_access_state(Some(slug), path, inputs);
    let session_user = member.map(|user| SessionUser { user, tenant });
    Ok((decision, session_user))
}

/// Response for a redirect decision
pub fn redirect_response(to: &str, reason: RedirectReason) -> Response {
    let body = Json(serde_json::json!({
        "success": false,
        "error": {
            "code": match reason {
                RedirectReason::Unauthenticated => "UNAUTHORIZED",
                RedirectReason::NoTenantAccess | RedirectReason::AlreadyAuthenticated => {
                    "FORBIDDEN"
                }
            },
            "message": format!("redirect: {}", reason.as_str()),
        },
        "redirect": to,
    }));

    let mut response = (StatusCode::SEE_OTHER, body).into_response();
    if let Ok(location) = HeaderValue::from_str(to) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    response
}

pub async fn require_tenant_access(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let (decision, session_user) = match decide(&state, &path, request.headers()).await {
        Ok(result) => result,
        Err(e) => return e.into_response(),
    };

    match decision {
        AccessState::Allow => {
            if let Some(session_user) = session_user {
                request.extensions_mut().insert(session_user);
            }
            next.run(request).await
        }
        AccessState::Redirect { to, reason } => {
            debug!(path = %path, reason = reason.as_str(), "Redirecting tenant request");
            redirect_response(&to, reason)
        }
        AccessState::TenantNotFound => {
            ApiError::NotFound("tenant not found".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; iview_session=abc.def"),
        );
        assert_eq!(cookie_value(&headers, "iview_session"), Some("abc.def"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_value_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("iview_session=tok"));
        assert_eq!(cookie_value(&headers, "iview_session"), Some("tok"));
    }

    #[test]
    fn test_split_tenant_path() {
        assert_eq!(split_tenant_path("/t/acme/app/me"), Some(("acme", "/app/me")));
        assert_eq!(split_tenant_path("/t/acme"), Some(("acme", "")));
        assert_eq!(split_tenant_path("/t//app"), None);
        assert_eq!(split_tenant_path("/api/admin"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", 3600);
        assert!(cookie.starts_with("iview_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_redirect_response() {
        let response = redirect_response(
            "/t/acme/login?next=%2Ft%2Facme%2Fapp",
            RedirectReason::Unauthenticated,
        );
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/t/acme/login?next=%2Ft%2Facme%2Fapp"
        );
    }
}
