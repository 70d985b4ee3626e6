//! Versioned schema migrations
//!
//! Runs after table creation and column sync, for changes sync cannot express
//! (indexes, data rewrites). Each migration is idempotent and recorded in
//! `schema_version`. Never edit a released migration; add a new one.

use crate::db::schema_sync::column_exists;
use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version. Increment when adding a migration.
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// Latest applied version, 0 for a fresh database
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations in order
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({}); proceeding",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

/// v1: lookup indexes and custom-domain uniqueness
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let statements = [
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_tenants_custom_domain \
         ON tenants(custom_domain)",
        "CREATE INDEX IF NOT EXISTS idx_interviews_tenant ON interviews(tenant_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_questions_interview \
         ON questions(interview_id, position)",
        "CREATE INDEX IF NOT EXISTS idx_invitations_interview ON invitations(interview_id)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_interview ON sessions(interview_id)",
        "CREATE INDEX IF NOT EXISTS idx_audit_log_tenant ON audit_log(tenant_id, created_at)",
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

/// v2: emails are compared case-insensitively; store them lowercased
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    if column_exists(pool, "users", "email").await? {
        let result = sqlx::query(
            "UPDATE OR IGNORE users SET email = lower(email) WHERE email != lower(email)",
        )
        .execute(pool)
        .await?;
        if result.rows_affected() > 0 {
            info!("Migration v2: lowercased {} user email(s)", result.rows_affected());
        }
    }

    if column_exists(pool, "invitations", "candidate_email").await? {
        sqlx::query(
            "UPDATE invitations SET candidate_email = lower(candidate_email) \
             WHERE candidate_email != lower(candidate_email)",
        )
        .execute(pool)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::connect_in_memory;

    #[tokio::test]
    async fn test_fresh_database_reaches_current_version() {
        let pool = connect_in_memory().await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, CURRENT_SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_v1_creates_lookup_indexes() {
        let pool = connect_in_memory().await.unwrap();
        let indexes: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(indexes, 6);
        assert_eq!(CURRENT_SCHEMA_VERSION, 2);
    }

    #[tokio::test]
    async fn test_v2_lowercases_emails() {
        let pool = connect_in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO tenants (id, slug, name, created_at) \
             VALUES ('t1', 'acme', 'Acme', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO users \
             (id, tenant_id, email, display_name, role, password_hash, password_salt, created_at) \
             VALUES ('u1', 't1', 'Mixed@Example.COM', 'M', 'hr', 'h', 's', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        migrate_v2(&pool).await.unwrap();

        let email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = 'u1'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(email, "mixed@example.com");
    }
}
