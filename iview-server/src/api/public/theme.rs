//! Tenant branding for public pages

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};
use iview_common::db::Tenant;
use serde::Serialize;

use crate::api::envelope::{ok, Envelope};
use crate::db::tenants;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const DEFAULT_PRIMARY_COLOR: &str = "#1f2937";
pub const DEFAULT_ACCENT_COLOR: &str = "#2563eb";

#[derive(Debug, Clone, Serialize)]
pub struct TenantTheme {
    pub name: String,
    pub slug: String,
    pub primary_color: String,
    pub accent_color: String,
    pub logo_url: Option<String>,
}

impl From<&Tenant> for TenantTheme {
    fn from(tenant: &Tenant) -> Self {
        Self {
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            primary_color: tenant
                .theme_primary_color
                .clone()
                .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
            accent_color: tenant
                .theme_accent_color
                .clone()
                .unwrap_or_else(|| DEFAULT_ACCENT_COLOR.to_string()),
            logo_url: tenant.logo_url.clone(),
        }
    }
}

/// GET /api/tenants/:slug/theme
pub async fn tenant_theme(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Envelope<TenantTheme>>> {
    let tenant = tenants::find_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("tenant '{}' not found", slug)))?;
    ok(TenantTheme::from(&tenant))
}

/// GET /api/theme, resolving the tenant from the `host` header's custom domain
pub async fn theme_for_host(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Envelope<TenantTheme>>> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("host header required".to_string()))?;

    let tenant = tenants::find_by_domain(&state.db, host)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no tenant for domain '{}'", host)))?;
    ok(TenantTheme::from(&tenant))
}
