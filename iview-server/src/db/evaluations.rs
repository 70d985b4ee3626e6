//! Reviewer scores for candidate responses

use iview_common::db::Evaluation;
use iview_common::{time, Error, Result};
use sqlx::SqlitePool;

use super::new_id;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

/// One reviewer holds at most one evaluation per response; scoring again
/// replaces it.
pub async fn upsert(
    db: &SqlitePool,
    tenant_id: &str,
    response_id: &str,
    reviewer_id: &str,
    score: i64,
    notes: Option<&str>,
) -> Result<Evaluation> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(Error::InvalidInput(format!(
            "score must be between {} and {}",
            MIN_SCORE, MAX_SCORE
        )));
    }

    let now = time::now();
    let evaluation = sqlx::query_as::<_, Evaluation>(
        r#"
        INSERT INTO evaluations
            (id, tenant_id, response_id, reviewer_id, score, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (response_id, reviewer_id) DO UPDATE SET
            score = excluded.score,
            notes = excluded.notes,
            updated_at = excluded.updated_at
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(tenant_id)
    .bind(response_id)
    .bind(reviewer_id)
    .bind(score)
    .bind(notes)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await?;
    Ok(evaluation)
}
