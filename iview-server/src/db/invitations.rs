//! Candidate invitations
//!
//! The token is the only credential a candidate holds, so it is long and
//! random. An invitation resolves only while `pending` and unexpired; starting
//! an interview flips it to `used` exactly once (see [`super::sessions::start`]).

use chrono::{DateTime, Utc};
use iview_common::db::Invitation;
use iview_common::{time, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::SqlitePool;

use super::new_id;

pub const TOKEN_LEN: usize = 40;

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub candidate_email: String,
    pub candidate_name: Option<String>,
    pub expires_at: DateTime<Utc>,
}

pub async fn create(
    db: &SqlitePool,
    tenant_id: &str,
    interview_id: &str,
    new: &NewInvitation,
) -> Result<Invitation> {
    let invitation = sqlx::query_as::<_, Invitation>(
        r#"
        INSERT INTO invitations (
            id, tenant_id, interview_id, candidate_email, candidate_name, token, status,
            expires_at, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(tenant_id)
    .bind(interview_id)
    .bind(&new.candidate_email)
    .bind(&new.candidate_name)
    .bind(generate_token())
    .bind(new.expires_at)
    .bind(time::now())
    .fetch_one(db)
    .await?;
    Ok(invitation)
}

pub async fn find(db: &SqlitePool, tenant_id: &str, id: &str) -> Result<Option<Invitation>> {
    let invitation = sqlx::query_as::<_, Invitation>(
        "SELECT * FROM invitations WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant_id)
    .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(invitation)
}

pub async fn find_by_token(db: &SqlitePool, token: &str) -> Result<Option<Invitation>> {
    let invitation = sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE token = ?")
        .bind(token)
        .fetch_optional(db)
        .await?;
    Ok(invitation)
}

pub async fn count_for_interview(
    db: &SqlitePool,
    tenant_id: &str,
    interview_id: &str,
) -> Result<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM invitations WHERE tenant_id = ? AND interview_id = ?",
    )
    .bind(tenant_id)
    .bind(interview_id)
    .fetch_one(db)
    .await?;
    Ok(total)
}

/// Newest first
pub async fn list_for_interview(
    db: &SqlitePool,
    tenant_id: &str,
    interview_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Invitation>> {
    let invitations = sqlx::query_as::<_, Invitation>(
        r#"
        SELECT * FROM invitations
        WHERE tenant_id = ? AND interview_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(tenant_id)
    .bind(interview_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(invitations)
}

/// Revoke a pending invitation. `None` when it does not exist; the current
/// row unchanged when it is no longer pending.
pub async fn revoke(
    db: &SqlitePool,
    tenant_id: &str,
    id: &str,
) -> Result<Option<(Invitation, bool)>> {
    let revoked = sqlx::query_as::<_, Invitation>(
        r#"
        UPDATE invitations SET status = 'revoked'
        WHERE tenant_id = ? AND id = ? AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(db)
    .await?;

    match revoked {
        Some(invitation) => Ok(Some((invitation, true))),
        None => Ok(find(db, tenant_id, id).await?.map(|inv| (inv, false))),
    }
}
