//! # iview Common Library
//!
//! Shared code for the iview interview service:
//! - Database schema, initialization and row models
//! - API key, password and session token primitives
//! - Tenant route-access decisions
//! - CSV export of interview results
//! - Configuration loading

pub mod access;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod time;

pub use error::{Error, Result};
