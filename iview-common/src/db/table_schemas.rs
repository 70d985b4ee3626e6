//! Declared column sets for the sync pass
//!
//! Before migrations run, any declared column missing from an existing table
//! is added with `ALTER TABLE ... ADD COLUMN`. `CREATE TABLE` statements in
//! [`crate::db::init`] already contain every column for fresh databases.

use crate::db::schema_sync::{sync_table, ColumnDefinition, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

pub struct TenantsTableSchema;

impl TableSchema for TenantsTableSchema {
    fn table_name() -> &'static str {
        "tenants"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT"),
            ColumnDefinition::new("slug", "TEXT").not_null(),
            ColumnDefinition::new("name", "TEXT").not_null(),
            // Theming
            ColumnDefinition::new("theme_primary_color", "TEXT"),
            ColumnDefinition::new("theme_accent_color", "TEXT"),
            ColumnDefinition::new("logo_url", "TEXT"),
            // Uniqueness comes from idx_tenants_custom_domain (migration v1)
            ColumnDefinition::new("custom_domain", "TEXT"),
            ColumnDefinition::new("created_at", "TEXT").not_null(),
        ]
    }
}

pub struct InvitationsTableSchema;

impl TableSchema for InvitationsTableSchema {
    fn table_name() -> &'static str {
        "invitations"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT"),
            ColumnDefinition::new("candidate_email", "TEXT").not_null(),
            ColumnDefinition::new("candidate_name", "TEXT"),
            ColumnDefinition::new("token", "TEXT").not_null(),
            ColumnDefinition::new("status", "TEXT").not_null().default("'pending'"),
            ColumnDefinition::new("expires_at", "TEXT").not_null(),
            ColumnDefinition::new("used_at", "TEXT"),
        ]
    }
}

pub struct ApiKeysTableSchema;

impl TableSchema for ApiKeysTableSchema {
    fn table_name() -> &'static str {
        "api_keys"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT"),
            ColumnDefinition::new("key_prefix", "TEXT").not_null(),
            ColumnDefinition::new("key_hash", "TEXT").not_null(),
            ColumnDefinition::new("salt", "TEXT").not_null(),
            ColumnDefinition::new("scopes", "TEXT").not_null().default("''"),
            ColumnDefinition::new("last_used_at", "TEXT"),
            ColumnDefinition::new("revoked_at", "TEXT"),
        ]
    }
}

/// Synchronize all declared table schemas
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    let added = sync_table::<TenantsTableSchema>(pool).await?
        + sync_table::<InvitationsTableSchema>(pool).await?
        + sync_table::<ApiKeysTableSchema>(pool).await?;

    if added > 0 {
        info!("Schema sync added {} column(s)", added);
    }

    Ok(())
}
