//! Audit log storage

use iview_common::db::{ActorType, AuditEntry};
use iview_common::{time, Result};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::new_id;

/// Row to append
#[derive(Debug, Clone)]
pub struct NewAuditEntry<'a> {
    pub tenant_id: &'a str,
    pub actor_type: ActorType,
    pub actor_id: Option<&'a str>,
    pub action: &'a str,
    pub resource_type: &'a str,
    pub resource_id: Option<&'a str>,
    pub details: Option<serde_json::Value>,
}

pub async fn insert(db: &SqlitePool, entry: &NewAuditEntry<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (
            id, tenant_id, actor_type, actor_id, action, resource_type, resource_id, details,
            created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new_id())
    .bind(entry.tenant_id)
    .bind(entry.actor_type)
    .bind(entry.actor_id)
    .bind(entry.action)
    .bind(entry.resource_type)
    .bind(entry.resource_id)
    .bind(entry.details.as_ref().map(|d| d.to_string()))
    .bind(time::now())
    .execute(db)
    .await?;
    Ok(())
}

/// Optional `?action=` / `?resource_type=` filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub resource_type: Option<String>,
}

fn push_filters<'a>(
    qb: &mut QueryBuilder<'a, Sqlite>,
    tenant_id: &'a str,
    filter: &'a AuditFilter,
) {
    qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
    if let Some(action) = &filter.action {
        qb.push(" AND action = ").push_bind(action.as_str());
    }
    if let Some(resource_type) = &filter.resource_type {
        qb.push(" AND resource_type = ").push_bind(resource_type.as_str());
    }
}

pub async fn count(db: &SqlitePool, tenant_id: &str, filter: &AuditFilter) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM audit_log");
    push_filters(&mut qb, tenant_id, filter);
    let total = qb.build_query_scalar::<i64>().fetch_one(db).await?;
    Ok(total)
}

/// Newest first
pub async fn list(
    db: &SqlitePool,
    tenant_id: &str,
    filter: &AuditFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<AuditEntry>> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM audit_log");
    push_filters(&mut qb, tenant_id, filter);
    qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let entries = qb.build_query_as::<AuditEntry>().fetch_all(db).await?;
    Ok(entries)
}
