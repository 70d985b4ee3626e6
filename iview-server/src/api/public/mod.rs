//! Unauthenticated endpoints

mod embed;
mod health;
mod invite;
mod theme;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/embed.js", get(embed::embed_script))
        .route("/api/theme", get(theme::theme_for_host))
        .route("/api/tenants/:slug/theme", get(theme::tenant_theme))
        .route("/api/invite/:token", get(invite::get_invitation))
        .route("/api/invite/:token/start", post(invite::start_interview))
        .route("/api/sessions/:id/responses", post(invite::submit_response))
        .route("/api/sessions/:id/complete", post(invite::complete_session))
}
