//! API key records
//!
//! Only the prefix, salt and salted hash are stored. The plaintext leaves the
//! process once, in the response to [`create`].

use iview_common::auth::{generate_api_key, ScopeSet};
use iview_common::db::ApiKeyRecord;
use iview_common::{time, Result};
use serde::Serialize;
use sqlx::SqlitePool;

use super::new_id;

/// Key record plus its one-time plaintext
#[derive(Debug, Serialize)]
pub struct CreatedApiKey {
    #[serde(flatten)]
    pub record: ApiKeyRecord,
    pub key: String,
}

pub async fn create(
    db: &SqlitePool,
    tenant_id: &str,
    name: &str,
    scopes: &ScopeSet,
) -> Result<CreatedApiKey> {
    let generated = generate_api_key();

    let record = sqlx::query_as::<_, ApiKeyRecord>(
        r#"
        INSERT INTO api_keys (id, tenant_id, name, key_prefix, key_hash, salt, scopes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(tenant_id)
    .bind(name)
    .bind(&generated.prefix)
    .bind(&generated.hash)
    .bind(&generated.salt)
    .bind(scopes.to_db_string())
    .bind(time::now())
    .fetch_one(db)
    .await?;

    Ok(CreatedApiKey {
        record,
        key: generated.plaintext,
    })
}

pub async fn find_by_prefix(db: &SqlitePool, prefix: &str) -> Result<Option<ApiKeyRecord>> {
    let record =
        sqlx::query_as::<_, ApiKeyRecord>("SELECT * FROM api_keys WHERE key_prefix = ?")
            .bind(prefix)
            .fetch_optional(db)
            .await?;
    Ok(record)
}

pub async fn count(db: &SqlitePool, tenant_id: &str) -> Result<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys WHERE tenant_id = ?")
        .bind(tenant_id)
        .fetch_one(db)
        .await?;
    Ok(total)
}

/// Newest first
pub async fn list(
    db: &SqlitePool,
    tenant_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<ApiKeyRecord>> {
    let records = sqlx::query_as::<_, ApiKeyRecord>(
        "SELECT * FROM api_keys WHERE tenant_id = ? ORDER BY created_at DESC, id LIMIT ? OFFSET ?",
    )
    .bind(tenant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(records)
}

/// Set `revoked_at`; returns false when no unrevoked key matched
pub async fn revoke(db: &SqlitePool, tenant_id: &str, id: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE api_keys SET revoked_at = ? WHERE tenant_id = ? AND id = ? AND revoked_at IS NULL",
    )
    .bind(time::now())
    .bind(tenant_id)
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn touch_last_used(db: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
        .bind(time::now())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
