//! Database schema, initialization and row models

pub mod init;
pub mod migrations;
pub mod models;
pub mod schema_sync;
pub mod table_schemas;

pub use init::{connect_in_memory, init_database, init_schema};
pub use models::*;
pub use schema_sync::column_exists;
