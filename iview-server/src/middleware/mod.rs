//! Request authentication for the admin API and tenant app routes

pub mod api_key;
pub mod tenant;
