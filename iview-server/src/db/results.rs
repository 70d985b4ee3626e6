//! Interview results: every (session, question) pair with its answer and
//! evaluation summary

use chrono::{DateTime, Utc};
use iview_common::db::SessionStatus;
use iview_common::export::ResultRow;
use iview_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;

/// Rows ordered by session start, then question position. Questions a
/// candidate skipped still appear with empty answer fields.
pub async fn rows(db: &SqlitePool, tenant_id: &str, interview_id: &str) -> Result<Vec<ResultRow>> {
    let rows = sqlx::query_as::<_, ResultRow>(
        r#"
        SELECT
            s.id AS session_id,
            i.candidate_name,
            i.candidate_email,
            s.status,
            s.started_at,
            s.completed_at,
            q.id AS question_id,
            q.position AS question_position,
            q.prompt AS question_prompt,
            r.id AS response_id,
            r.answer_text,
            r.media_url,
            (SELECT AVG(e.score) FROM evaluations e WHERE e.response_id = r.id) AS average_score,
            (SELECT COUNT(*) FROM evaluations e WHERE e.response_id = r.id) AS evaluation_count
        FROM sessions s
        JOIN invitations i ON i.id = s.invitation_id
        JOIN questions q ON q.interview_id = s.interview_id
        LEFT JOIN responses r ON r.session_id = s.id AND r.question_id = q.id
        WHERE s.tenant_id = ? AND s.interview_id = ?
        ORDER BY s.started_at, s.id, q.position
        "#,
    )
    .bind(tenant_id)
    .bind(interview_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[derive(Debug, Serialize)]
pub struct AnswerResult {
    pub question_id: String,
    pub question_position: i64,
    pub question_prompt: String,
    pub response_id: Option<String>,
    pub answer_text: Option<String>,
    pub media_url: Option<String>,
    pub average_score: Option<f64>,
    pub evaluation_count: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionResult {
    pub session_id: String,
    pub candidate_name: Option<String>,
    pub candidate_email: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Mean over this session's evaluated answers
    pub average_score: Option<f64>,
    pub answers: Vec<AnswerResult>,
}

/// Fold ordered rows into one entry per session
pub fn group_by_session(rows: Vec<ResultRow>) -> Vec<SessionResult> {
    let mut sessions: Vec<SessionResult> = Vec::new();

    for row in rows {
        let answer = AnswerResult {
            question_id: row.question_id,
            question_position: row.question_position,
            question_prompt: row.question_prompt,
            response_id: row.response_id,
            answer_text: row.answer_text,
            media_url: row.media_url,
            average_score: row.average_score,
            evaluation_count: row.evaluation_count,
        };

        match sessions.last_mut() {
            Some(current) if current.session_id == row.session_id => current.answers.push(answer),
            _ => sessions.push(SessionResult {
                session_id: row.session_id,
                candidate_name: row.candidate_name,
                candidate_email: row.candidate_email,
                status: row.status,
                started_at: row.started_at,
                completed_at: row.completed_at,
                average_score: None,
                answers: vec![answer],
            }),
        }
    }

    for session in &mut sessions {
        let scores: Vec<f64> = session.answers.iter().filter_map(|a| a.average_score).collect();
        if !scores.is_empty() {
            session.average_score = Some(scores.iter().sum::<f64>() / scores.len() as f64);
        }
    }

    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(session: &str, position: i64, score: Option<f64>) -> ResultRow {
        ResultRow {
            session_id: session.to_string(),
            candidate_name: None,
            candidate_email: format!("{}@example.com", session),
            status: SessionStatus::Completed,
            started_at: Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
            completed_at: None,
            question_id: format!("q{}", position),
            question_position: position,
            question_prompt: "Q".to_string(),
            response_id: None,
            answer_text: None,
            media_url: None,
            average_score: score,
            evaluation_count: score.map(|_| 1).unwrap_or(0),
        }
    }

    #[test]
    fn test_group_by_session() {
        let grouped = group_by_session(vec![
            row("s1", 0, Some(4.0)),
            row("s1", 1, Some(2.0)),
            row("s1", 2, None),
            row("s2", 0, None),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].answers.len(), 3);
        assert_eq!(grouped[0].average_score, Some(3.0));
        assert_eq!(grouped[1].candidate_email, "s2@example.com");
        assert_eq!(grouped[1].average_score, None);
    }
}
