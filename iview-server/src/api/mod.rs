//! HTTP API
//!
//! - `admin`: `/api/admin/...`, bearer API key, scoped, rate limited, CORS
//! - `app`: `/t/:slug/...`, session cookie, tenant access decision
//! - `public`: health, tenant theme, candidate invitation flow, embed script

pub mod admin;
pub mod app;
pub mod envelope;
pub mod public;

pub use admin::admin_routes;
pub use app::app_routes;
pub use public::public_routes;
