//! Query modules
//!
//! Every function touching tenant-owned rows takes the caller's `tenant_id`
//! and filters on it. A row belonging to another tenant is indistinguishable
//! from a missing row.

pub mod api_keys;
pub mod audit;
pub mod evaluations;
pub mod interviews;
pub mod invitations;
pub mod questions;
pub mod results;
pub mod sessions;
pub mod tenants;
pub mod users;

/// New random row id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
