//! Interview questions
//!
//! Positions within an interview always form the dense sequence `0..n`.
//! Append takes the next free slot; delete and reorder renumber inside one
//! transaction so a concurrent reader never sees a gap or duplicate.

use std::collections::HashSet;

use iview_common::db::{Question, QuestionKind};
use iview_common::{time, Error, Result};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::new_id;

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub prompt: String,
    pub kind: QuestionKind,
    pub time_limit_secs: Option<i64>,
}

/// Partial update; `time_limit_secs: Some(None)` removes the limit
#[derive(Debug, Clone, Default)]
pub struct QuestionUpdate {
    pub prompt: Option<String>,
    pub kind: Option<QuestionKind>,
    pub time_limit_secs: Option<Option<i64>>,
}

/// Ordered by position
pub async fn list(db: &SqlitePool, tenant_id: &str, interview_id: &str) -> Result<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT * FROM questions WHERE tenant_id = ? AND interview_id = ? ORDER BY position",
    )
    .bind(tenant_id)
    .bind(interview_id)
    .fetch_all(db)
    .await?;
    Ok(questions)
}

pub async fn find(db: &SqlitePool, tenant_id: &str, id: &str) -> Result<Option<Question>> {
    let question =
        sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(db)
            .await?;
    Ok(question)
}

/// Append at the end of the interview. The caller has already checked the
/// interview belongs to `tenant_id`.
pub async fn append(
    db: &SqlitePool,
    tenant_id: &str,
    interview_id: &str,
    new: &NewQuestion,
) -> Result<Question> {
    let mut tx = db.begin().await?;

    let next: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE interview_id = ?")
        .bind(interview_id)
        .fetch_one(&mut *tx)
        .await?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions
            (id, tenant_id, interview_id, prompt, kind, time_limit_secs, position, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(tenant_id)
    .bind(interview_id)
    .bind(&new.prompt)
    .bind(new.kind)
    .bind(new.time_limit_secs)
    .bind(next)
    .bind(time::now())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(question)
}

pub async fn update(
    db: &SqlitePool,
    tenant_id: &str,
    id: &str,
    update: &QuestionUpdate,
) -> Result<Option<Question>> {
    let question = sqlx::query_as::<_, Question>(
        r#"
        UPDATE questions SET
            prompt = COALESCE(?, prompt),
            kind = COALESCE(?, kind),
            time_limit_secs = CASE WHEN ? THEN ? ELSE time_limit_secs END
        WHERE tenant_id = ? AND id = ?
        RETURNING *
        "#,
    )
    .bind(&update.prompt)
    .bind(update.kind)
    .bind(update.time_limit_secs.is_some())
    .bind(update.time_limit_secs.flatten())
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(question)
}

async fn renumber(tx: &mut Transaction<'_, Sqlite>, ids: &[String]) -> Result<()> {
    for (position, id) in ids.iter().enumerate() {
        sqlx::query("UPDATE questions SET position = ? WHERE id = ?")
            .bind(position as i64)
            .bind(id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Delete a question and close the gap it leaves. Returns the deleted row.
pub async fn delete_and_compact(
    db: &SqlitePool,
    tenant_id: &str,
    id: &str,
) -> Result<Option<Question>> {
    let mut tx = db.begin().await?;

    let deleted = sqlx::query_as::<_, Question>(
        "DELETE FROM questions WHERE tenant_id = ? AND id = ? RETURNING *",
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(deleted) = deleted else {
        return Ok(None);
    };

    let remaining: Vec<String> =
        sqlx::query_scalar("SELECT id FROM questions WHERE interview_id = ? ORDER BY position")
            .bind(&deleted.interview_id)
            .fetch_all(&mut *tx)
            .await?;
    renumber(&mut tx, &remaining).await?;

    tx.commit().await?;
    Ok(Some(deleted))
}

/// Apply a new order. `ordered_ids` must name every question of the
/// interview exactly once.
pub async fn reorder(
    db: &SqlitePool,
    tenant_id: &str,
    interview_id: &str,
    ordered_ids: &[String],
) -> Result<Vec<Question>> {
    let mut tx = db.begin().await?;

    let current: Vec<String> = sqlx::query_scalar(
        "SELECT id FROM questions WHERE tenant_id = ? AND interview_id = ?",
    )
    .bind(tenant_id)
    .bind(interview_id)
    .fetch_all(&mut *tx)
    .await?;

    let expected: HashSet<&str> = current.iter().map(String::as_str).collect();
    let given: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
    if given.len() != ordered_ids.len() {
        return Err(Error::InvalidInput("question order contains duplicates".to_string()));
    }
    if given != expected {
        return Err(Error::InvalidInput(
            "question order must list every question of the interview exactly once".to_string(),
        ));
    }

    renumber(&mut tx, ordered_ids).await?;
    tx.commit().await?;

    list(db, tenant_id, interview_id).await
}
