//! Tenant route-access decisions
//!
//! Decides whether a request for a tenant route may proceed or must be
//! redirected. Pure functions only; the HTTP layer gathers the four inputs
//! (route classification, session validity, tenant membership) and turns the
//! resulting [`AccessState`] into a response.

use serde::Serialize;

/// Facts about one request that drive the access decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessInputs {
    /// Route needs no authentication (landing, invite, embed)
    pub is_public_route: bool,
    /// Route is a login or sign-up page
    pub is_auth_route: bool,
    /// Request carries a valid session
    pub is_authenticated: bool,
    /// Session user belongs to the requested tenant
    pub has_tenant_access: bool,
}

/// Why a request is being redirected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// Signed-in user opened a login page
    AlreadyAuthenticated,
    /// Protected route without a session
    Unauthenticated,
    /// Session user is not a member of this tenant
    NoTenantAccess,
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::AlreadyAuthenticated => "already_authenticated",
            RedirectReason::Unauthenticated => "unauthenticated",
            RedirectReason::NoTenantAccess => "no_tenant_access",
        }
    }
}

/// Outcome of access resolution for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccessState {
    Allow,
    Redirect { to: String, reason: RedirectReason },
    TenantNotFound,
}

/// Evaluate the redirect table. Rules are checked in order; the first match wins.
///
/// | auth route & signed in | public or auth route | signed in | member | result |
/// |---|---|---|---|---|
/// | yes | - | - | - | `AlreadyAuthenticated` |
/// | no | yes | - | - | none |
/// | no | no | no | - | `Unauthenticated` |
/// | no | no | yes | no | `NoTenantAccess` |
/// | no | no | yes | yes | none |
pub fn why_redirect(inputs: AccessInputs) -> Option<RedirectReason> {
    if inputs.is_auth_route && inputs.is_authenticated {
        return Some(RedirectReason::AlreadyAuthenticated);
    }
    if inputs.is_public_route || inputs.is_auth_route {
        return None;
    }
    if !inputs.is_authenticated {
        return Some(RedirectReason::Unauthenticated);
    }
    if !inputs.has_tenant_access {
        return Some(RedirectReason::NoTenantAccess);
    }
    None
}

/// Resolve the access state for `path` inside tenant `tenant_slug`.
///
/// `tenant_slug` is `None` when tenant resolution failed; that short-circuits
/// to [`AccessState::TenantNotFound`] before the table is consulted.
pub fn resolve_access_state(
    tenant_slug: Option<&str>,
    path: &str,
    inputs: AccessInputs,
) -> AccessState {
    let Some(slug) = tenant_slug else {
        return AccessState::TenantNotFound;
    };

    match why_redirect(inputs) {
        None => AccessState::Allow,
        Some(reason) => AccessState::Redirect {
            to: redirect_target(slug, path, reason),
            reason,
        },
    }
}

/// Target location for a redirect reason
pub fn redirect_target(slug: &str, path: &str, reason: RedirectReason) -> String {
    match reason {
        RedirectReason::AlreadyAuthenticated => format!("/t/{}/app", slug),
        RedirectReason::Unauthenticated => {
            format!("/t/{}/login?next={}", slug, urlencoding::encode(path))
        }
        RedirectReason::NoTenantAccess => format!("/t/{}/no-access", slug),
    }
}

/// Classify a tenant-relative path: returns `(is_public_route, is_auth_route)`
///
/// `rest` is the part after `/t/{slug}`, e.g. `/login` or `/app/interviews`.
pub fn classify_tenant_path(rest: &str) -> (bool, bool) {
    let trimmed = rest.trim_end_matches('/');
    let is_auth = matches!(trimmed, "/login" | "/signup" | "/auth/login");
    let is_public = trimmed.is_empty()
        || trimmed == "/no-access"
        || trimmed.starts_with("/interview/")
        || trimmed.starts_with("/theme");
    (is_public, is_auth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(public: bool, auth: bool, signed_in: bool, member: bool) -> AccessInputs {
        AccessInputs {
            is_public_route: public,
            is_auth_route: auth,
            is_authenticated: signed_in,
            has_tenant_access: member,
        }
    }

    #[test]
    fn test_full_decision_table() {
        use RedirectReason::*;

        // Exhaustive over all 16 combinations
        for bits in 0u8..16 {
            let public = bits & 1 != 0;
            let auth = bits & 2 != 0;
            let signed_in = bits & 4 != 0;
            let member = bits & 8 != 0;

            let expected = if auth && signed_in {
                Some(AlreadyAuthenticated)
            } else if public || auth {
                None
            } else if !signed_in {
                Some(Unauthenticated)
            } else if !member {
                Some(NoTenantAccess)
            } else {
                None
            };

            assert_eq!(
                why_redirect(inputs(public, auth, signed_in, member)),
                expected,
                "public={} auth={} signed_in={} member={}",
                public,
                auth,
                signed_in,
                member
            );
        }
    }

    #[test]
    fn test_member_on_protected_route_allowed() {
        let state = resolve_access_state(
            Some("acme"),
            "/t/acme/app/interviews",
            inputs(false, false, true, true),
        );
        assert_eq!(state, AccessState::Allow);
    }

    #[test]
    fn test_unauthenticated_redirects_to_login_with_next() {
        let state = resolve_access_state(
            Some("acme"),
            "/t/acme/app/interviews?status=active",
            inputs(false, false, false, false),
        );
        assert_eq!(
            state,
            AccessState::Redirect {
                to: "/t/acme/login?next=%2Ft%2Facme%2Fapp%2Finterviews%3Fstatus%3Dactive"
                    .to_string(),
                reason: RedirectReason::Unauthenticated,
            }
        );
    }

    #[test]
    fn test_signed_in_user_on_login_page_goes_to_app() {
        let state =
            resolve_access_state(Some("acme"), "/t/acme/login", inputs(false, true, true, true));
        assert_eq!(
            state,
            AccessState::Redirect {
                to: "/t/acme/app".to_string(),
                reason: RedirectReason::AlreadyAuthenticated,
            }
        );
    }

    #[test]
    fn test_foreign_tenant_user_gets_no_access_page() {
        let state =
            resolve_access_state(Some("acme"), "/t/acme/app", inputs(false, false, true, false));
        assert_eq!(
            state,
            AccessState::Redirect {
                to: "/t/acme/no-access".to_string(),
                reason: RedirectReason::NoTenantAccess,
            }
        );
    }

    #[test]
    fn test_unknown_tenant_short_circuits() {
        let state = resolve_access_state(None, "/t/ghost/app", inputs(false, false, true, true));
        assert_eq!(state, AccessState::TenantNotFound);
    }

    #[test]
    fn test_classify_tenant_path() {
        assert_eq!(classify_tenant_path(""), (true, false));
        assert_eq!(classify_tenant_path("/login"), (false, true));
        assert_eq!(classify_tenant_path("/login/"), (false, true));
        assert_eq!(classify_tenant_path("/app"), (false, false));
        assert_eq!(classify_tenant_path("/app/interviews/1"), (false, false));
        assert_eq!(classify_tenant_path("/interview/abc"), (true, false));
        assert_eq!(classify_tenant_path("/no-access"), (true, false));
    }

    #[test]
    fn test_access_state_serializes_with_tag() {
        let json = serde_json::to_value(AccessState::Redirect {
            to: "/t/a/app".to_string(),
            reason: RedirectReason::AlreadyAuthenticated,
        })
        .unwrap();
        assert_eq!(json["state"], "redirect");
        assert_eq!(json["reason"], "already_authenticated");
        assert_eq!(json["to"], "/t/a/app");
    }
}
