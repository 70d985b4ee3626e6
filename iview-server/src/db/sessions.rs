//! Interview sessions and candidate responses

use iview_common::db::{CandidateResponse, Invitation, InterviewSession};
use iview_common::{time, Error, Result};
use sqlx::SqlitePool;

use super::new_id;

/// Consume a pending invitation and open its session in one transaction.
///
/// Fails with `Conflict` when the invitation was used, revoked or expired
/// between the caller's check and this update.
pub async fn start(db: &SqlitePool, invitation: &Invitation) -> Result<InterviewSession> {
    let now = time::now();
    let mut tx = db.begin().await?;

    let claimed = sqlx::query(
        r#"
        UPDATE invitations SET status = 'used', used_at = ?
        WHERE id = ? AND status = 'pending' AND expires_at > ?
        "#,
    )
    .bind(now)
    .bind(&invitation.id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if claimed.rows_affected() != 1 {
        return Err(Error::Conflict("invitation has already been used".to_string()));
    }

    let session = sqlx::query_as::<_, InterviewSession>(
        r#"
        INSERT INTO sessions (id, tenant_id, interview_id, invitation_id, status, started_at)
        VALUES (?, ?, ?, ?, 'in_progress', ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&invitation.tenant_id)
    .bind(&invitation.interview_id)
    .bind(&invitation.id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(session)
}

pub async fn set_conductor_url(db: &SqlitePool, id: &str, url: &str) -> Result<()> {
    sqlx::query("UPDATE sessions SET conductor_session_url = ? WHERE id = ?")
        .bind(url)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Session by id alone; candidate routes hold only the session id
pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<InterviewSession>> {
    let session = sqlx::query_as::<_, InterviewSession>("SELECT * FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(session)
}

/// Close an in-progress session; `None` when it was not in progress
pub async fn complete(db: &SqlitePool, id: &str) -> Result<Option<InterviewSession>> {
    let session = sqlx::query_as::<_, InterviewSession>(
        r#"
        UPDATE sessions SET status = 'completed', completed_at = ?
        WHERE id = ? AND status = 'in_progress'
        RETURNING *
        "#,
    )
    .bind(time::now())
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(session)
}

/// Insert or replace the answer to one question
pub async fn upsert_response(
    db: &SqlitePool,
    session: &InterviewSession,
    question_id: &str,
    answer_text: Option<&str>,
    media_url: Option<&str>,
) -> Result<CandidateResponse> {
    let response = sqlx::query_as::<_, CandidateResponse>(
        r#"
        INSERT INTO responses
            (id, tenant_id, session_id, question_id, answer_text, media_url, submitted_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (session_id, question_id) DO UPDATE SET
            answer_text = excluded.answer_text,
            media_url = excluded.media_url,
            submitted_at = excluded.submitted_at
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(&session.tenant_id)
    .bind(&session.id)
    .bind(question_id)
    .bind(answer_text)
    .bind(media_url)
    .bind(time::now())
    .fetch_one(db)
    .await?;
    Ok(response)
}

pub async fn find_response(
    db: &SqlitePool,
    tenant_id: &str,
    id: &str,
) -> Result<Option<CandidateResponse>> {
    let response = sqlx::query_as::<_, CandidateResponse>(
        "SELECT * FROM responses WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{interviews, invitations, questions, tenants};
    use chrono::Duration;
    use iview_common::db::{connect_in_memory, InterviewStatus, QuestionKind, SessionStatus};

    async fn setup() -> (SqlitePool, Invitation, String) {
        let db = connect_in_memory().await.unwrap();
        let tenant = tenants::create(&db, "acme", "Acme").await.unwrap();
        let interview = interviews::create(
            &db,
            &tenant.id,
            &interviews::NewInterview {
                title: "Backend".to_string(),
                description: None,
                job_title: None,
                status: InterviewStatus::Active,
                created_by: None,
            },
        )
        .await
        .unwrap();
        let question = questions::append(
            &db,
            &tenant.id,
            &interview.id,
            &questions::NewQuestion {
                prompt: "Why?".to_string(),
                kind: QuestionKind::Text,
                time_limit_secs: None,
            },
        )
        .await
        .unwrap();
        let invitation = invitations::create(
            &db,
            &tenant.id,
            &interview.id,
            &invitations::NewInvitation {
                candidate_email: "ada@example.com".to_string(),
                candidate_name: None,
                expires_at: time::now() + Duration::days(1),
            },
        )
        .await
        .unwrap();
        (db, invitation, question.id)
    }

    #[tokio::test]
    async fn test_start_is_single_use() {
        let (db, invitation, _) = setup().await;

        let session = start(&db, &invitation).await.unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);

        let second = start(&db, &invitation).await;
        assert!(matches!(second, Err(Error::Conflict(_))));

        let used = invitations::find_by_token(&db, &invitation.token).await.unwrap().unwrap();
        assert!(used.used_at.is_some());
    }

    #[tokio::test]
    async fn test_resubmission_replaces_answer() {
        let (db, invitation, question_id) = setup().await;
        let session = start(&db, &invitation).await.unwrap();

        let first = upsert_response(&db, &session, &question_id, Some("first"), None)
            .await
            .unwrap();
        let second = upsert_response(&db, &session, &question_id, Some("second"), None)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.answer_text.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_complete_once() {
        let (db, invitation, _) = setup().await;
        let session = start(&db, &invitation).await.unwrap();

        let done = complete(&db, &session.id).await.unwrap().unwrap();
        assert_eq!(done.status, SessionStatus::Completed);
        assert!(done.completed_at.is_some());
        assert!(complete(&db, &session.id).await.unwrap().is_none());
    }
}
