//! Interview CRUD

use iview_common::db::{Interview, InterviewStatus};
use iview_common::{time, Result};
use sqlx::SqlitePool;

use super::new_id;

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub title: String,
    pub description: Option<String>,
    pub job_title: Option<String>,
    pub status: InterviewStatus,
    pub created_by: Option<String>,
}

/// Partial update; `None` leaves a field unchanged, `Some(None)` clears it
#[derive(Debug, Clone, Default)]
pub struct InterviewUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub job_title: Option<Option<String>>,
    pub status: Option<InterviewStatus>,
}

pub async fn create(db: &SqlitePool, tenant_id: &str, new: &NewInterview) -> Result<Interview> {
    let now = time::now();
    let interview = sqlx::query_as::<_, Interview>(
        r#"
        INSERT INTO interviews (
            id, tenant_id, title, description, job_title, status, created_by,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(tenant_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.job_title)
    .bind(new.status)
    .bind(&new.created_by)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await?;
    Ok(interview)
}

pub async fn find(db: &SqlitePool, tenant_id: &str, id: &str) -> Result<Option<Interview>> {
    let interview =
        sqlx::query_as::<_, Interview>("SELECT * FROM interviews WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(db)
            .await?;
    Ok(interview)
}

/// Interview looked up without a tenant, for candidate-facing routes that
/// arrive with an invitation token
pub async fn find_any(db: &SqlitePool, id: &str) -> Result<Option<Interview>> {
    let interview = sqlx::query_as::<_, Interview>("SELECT * FROM interviews WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(interview)
}

pub async fn count(
    db: &SqlitePool,
    tenant_id: &str,
    status: Option<InterviewStatus>,
) -> Result<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM interviews WHERE tenant_id = ? AND (? IS NULL OR status = ?)",
    )
    .bind(tenant_id)
    .bind(status)
    .bind(status)
    .fetch_one(db)
    .await?;
    Ok(total)
}

/// Newest first
pub async fn list(
    db: &SqlitePool,
    tenant_id: &str,
    status: Option<InterviewStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Interview>> {
    let interviews = sqlx::query_as::<_, Interview>(
        r#"
        SELECT * FROM interviews
        WHERE tenant_id = ? AND (? IS NULL OR status = ?)
        ORDER BY created_at DESC, rowid DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(tenant_id)
    .bind(status)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(interviews)
}

pub async fn update(
    db: &SqlitePool,
    tenant_id: &str,
    id: &str,
    update: &InterviewUpdate,
) -> Result<Option<Interview>> {
    let interview = sqlx::query_as::<_, Interview>(
        r#"
        UPDATE interviews SET
            title = COALESCE(?, title),
            description = CASE WHEN ? THEN ? ELSE description END,
            job_title = CASE WHEN ? THEN ? ELSE job_title END,
            status = COALESCE(?, status),
            updated_at = ?
        WHERE tenant_id = ? AND id = ?
        RETURNING *
        "#,
    )
    .bind(&update.title)
    .bind(update.description.is_some())
    .bind(update.description.clone().flatten())
    .bind(update.job_title.is_some())
    .bind(update.job_title.clone().flatten())
    .bind(update.status)
    .bind(time::now())
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(interview)
}

/// Delete with cascade to questions, invitations and sessions
pub async fn delete(db: &SqlitePool, tenant_id: &str, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM interviews WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tenants;
    use iview_common::db::connect_in_memory;

    fn draft(title: &str) -> NewInterview {
        NewInterview {
            title: title.to_string(),
            description: None,
            job_title: Some("Engineer".to_string()),
            status: InterviewStatus::Draft,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let db = connect_in_memory().await.unwrap();
        let acme = tenants::create(&db, "acme", "Acme").await.unwrap();
        let globex = tenants::create(&db, "globex", "Globex").await.unwrap();

        let interview = create(&db, &acme.id, &draft("Backend")).await.unwrap();

        assert!(find(&db, &acme.id, &interview.id).await.unwrap().is_some());
        assert!(find(&db, &globex.id, &interview.id).await.unwrap().is_none());
        assert!(!delete(&db, &globex.id, &interview.id).await.unwrap());
        assert!(update(&db, &globex.id, &interview.id, &InterviewUpdate::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_status_filter_and_partial_update() {
        let db = connect_in_memory().await.unwrap();
        let acme = tenants::create(&db, "acme", "Acme").await.unwrap();
        let a = create(&db, &acme.id, &draft("A")).await.unwrap();
        create(&db, &acme.id, &draft("B")).await.unwrap();

        let updated = update(
            &db,
            &acme.id,
            &a.id,
            &InterviewUpdate {
                status: Some(InterviewStatus::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.status, InterviewStatus::Active);
        assert_eq!(updated.title, "A");
        assert_eq!(updated.job_title.as_deref(), Some("Engineer"));

        assert_eq!(count(&db, &acme.id, None).await.unwrap(), 2);
        assert_eq!(count(&db, &acme.id, Some(InterviewStatus::Active)).await.unwrap(), 1);
        let active = list(&db, &acme.id, Some(InterviewStatus::Active), 50, 0).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, a.id);
    }

    #[tokio::test]
    async fn test_update_clears_nullable_fields() {
        let db = connect_in_memory().await.unwrap();
        let acme = tenants::create(&db, "acme", "Acme").await.unwrap();
        let mut new = draft("A");
        new.description = Some("Remote".to_string());
        let a = create(&db, &acme.id, &new).await.unwrap();

        let cleared = update(
            &db,
            &acme.id,
            &a.id,
            &InterviewUpdate {
                job_title: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(cleared.job_title, None);
        assert_eq!(cleared.description.as_deref(), Some("Remote"));

        let replaced = update(
            &db,
            &acme.id,
            &a.id,
            &InterviewUpdate {
                description: Some(Some("On site".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(replaced.description.as_deref(), Some("On site"));
        assert_eq!(replaced.job_title, None);
    }
}
