//! Tenant app endpoints used by the employer and HR interface
//!
//! Sign-in and the access query live beside the protected group; everything
//! under `/t/:slug/app` runs [`require_tenant_access`] first.

mod auth;
mod interviews;
mod results;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::middleware::tenant::require_tenant_access;
use crate::AppState;

pub fn app_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/t/:slug/app/me", get(auth::me))
        .route(
            "/t/:slug/app/interviews",
            get(interviews::list_interviews).post(interviews::create_interview),
        )
        .route(
            "/t/:slug/app/interviews/:id",
            get(interviews::get_interview)
                .patch(interviews::update_interview)
                .delete(interviews::delete_interview),
        )
        .route(
            "/t/:slug/app/interviews/:id/questions",
            get(interviews::list_questions).post(interviews::add_question),
        )
        .route(
            "/t/:slug/app/interviews/:id/questions/order",
            put(interviews::reorder_questions),
        )
        .route(
            "/t/:slug/app/questions/:id",
            delete(interviews::delete_question).patch(interviews::update_question),
        )
        .route(
            "/t/:slug/app/interviews/:id/invitations",
            get(interviews::list_invitations).post(interviews::create_invitation),
        )
        .route("/t/:slug/app/interviews/:id/results", get(results::get_results))
        .route(
            "/t/:slug/app/interviews/:id/results.csv",
            get(results::export_results_csv),
        )
        .route(
            "/t/:slug/app/responses/:id/evaluations",
            post(results::upsert_evaluation),
        )
        .route_layer(middleware::from_fn_with_state(state, require_tenant_access));

    Router::new()
        .route("/t/:slug/auth/login", post(auth::login))
        .route("/t/:slug/auth/logout", post(auth::logout))
        .route("/t/:slug/access", get(auth::access))
        .merge(protected)
}
