//! Admin REST endpoints
//!
//! Every route authenticates a bearer API key, then applies the per-key rate
//! limit. The tenant is always the key's tenant. CORS wraps the whole group so
//! preflight requests are answered before authentication.

mod api_keys;
mod audit_log;
mod interviews;
mod invitations;
mod results;

use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::middleware::api_key::require_api_key;
use crate::rate_limit::limit_per_key;
use crate::AppState;

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/interviews",
            get(interviews::list_interviews).post(interviews::create_interview),
        )
        .route(
            "/api/admin/interviews/:id",
            get(interviews::get_interview)
                .patch(interviews::update_interview)
                .delete(interviews::delete_interview),
        )
        .route(
            "/api/admin/interviews/:id/questions",
            get(interviews::list_questions).post(interviews::add_question),
        )
        .route(
            "/api/admin/interviews/:id/questions/order",
            put(interviews::reorder_questions),
        )
        .route(
            "/api/admin/questions/:id",
            patch(interviews::update_question).delete(interviews::delete_question),
        )
        .route(
            "/api/admin/interviews/:id/invitations",
            get(invitations::list_invitations).post(invitations::create_invitation),
        )
        .route(
            "/api/admin/invitations/:id/revoke",
            post(invitations::revoke_invitation),
        )
        .route("/api/admin/interviews/:id/results", get(results::get_results))
        .route("/api/admin/interviews/:id/results.csv", get(results::export_results_csv))
        .route(
            "/api/admin/responses/:id/evaluations",
            post(results::upsert_evaluation),
        )
        .route("/api/admin/audit-log", get(audit_log::list_audit_log))
        .route(
            "/api/admin/api-keys",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route("/api/admin/api-keys/:id", delete(api_keys::revoke_api_key))
        // route_layer order: the last added runs first
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_per_key))
        .route_layer(middleware::from_fn_with_state(state, require_api_key))
        .layer(cors_layer())
}
