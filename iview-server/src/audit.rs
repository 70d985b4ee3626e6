//! Audit trail for mutations
//!
//! Recording never fails the request that triggered it; a failed insert is
//! logged and dropped.

use iview_common::db::ActorType;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::warn;

use crate::db::audit::{insert, NewAuditEntry};

/// Who performed a mutation, and in which tenant
#[derive(Debug, Clone)]
pub struct Actor {
    pub tenant_id: String,
    pub actor_type: ActorType,
    pub actor_id: Option<String>,
}

impl Actor {
    pub fn api_key(tenant_id: &str, key_id: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            actor_type: ActorType::ApiKey,
            actor_id: Some(key_id.to_string()),
        }
    }

    pub fn user(tenant_id: &str, user_id: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            actor_type: ActorType::User,
            actor_id: Some(user_id.to_string()),
        }
    }

    /// Candidate-driven or CLI actions
    pub fn system(tenant_id: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            actor_type: ActorType::System,
            actor_id: None,
        }
    }
}

pub async fn record(
    db: &SqlitePool,
    actor: &Actor,
    action: &str,
    resource_type: &str,
    resource_id: Option<&str>,
    details: Option<Value>,
) {
    let entry = NewAuditEntry {
        tenant_id: &actor.tenant_id,
        actor_type: actor.actor_type,
        actor_id: actor.actor_id.as_deref(),
        action,
        resource_type,
        resource_id,
        details,
    };

    if let Err(e) = insert(db, &entry).await {
        warn!(action = %action, "Failed to write audit entry: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{audit, tenants};
    use iview_common::db::connect_in_memory;

    #[tokio::test]
    async fn test_record_writes_entry() {
        let db = connect_in_memory().await.unwrap();
        let tenant = tenants::create(&db, "acme", "Acme").await.unwrap();
        let actor = Actor::api_key(&tenant.id, "key-1");

        record(&db, &actor, "interview.create", "interview", Some("i1"), None).await;

        let rows = audit::list(&db, &tenant.id, &Default::default(), 50, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].actor_type, ActorType::ApiKey);
        assert_eq!(rows[0].actor_id.as_deref(), Some("key-1"));
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let db = connect_in_memory().await.unwrap();
        // Unknown tenant violates the foreign key; must not panic or error
        record(&db, &Actor::system("missing"), "x", "y", None, None).await;
    }
}
