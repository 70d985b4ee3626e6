//! Tenant operations shared by the admin API and the tenant app routes
//!
//! Callers authenticate first and pass the resulting [`Actor`](crate::audit::Actor);
//! everything here is scoped to `actor.tenant_id`. Each mutation records an
//! audit entry after it succeeds.

pub mod evaluations;
pub mod interviews;
pub mod invitations;
pub mod questions;
pub mod results;
