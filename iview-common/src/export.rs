//! CSV export of interview results

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::models::SessionStatus;
use crate::Result;

/// Column order of the results export
pub const RESULTS_HEADER: [&str; 12] = [
    "session_id",
    "candidate_name",
    "candidate_email",
    "status",
    "started_at",
    "completed_at",
    "question_position",
    "question_prompt",
    "answer_text",
    "media_url",
    "average_score",
    "evaluation_count",
];

/// One (session, question) cell of the results grid
///
/// `question_id` and `response_id` are carried for the JSON view and are not
/// part of the CSV columns.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ResultRow {
    pub session_id: String,
    pub candidate_name: Option<String>,
    pub candidate_email: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub question_id: String,
    pub question_position: i64,
    pub question_prompt: String,
    pub response_id: Option<String>,
    pub answer_text: Option<String>,
    pub media_url: Option<String>,
    pub average_score: Option<f64>,
    pub evaluation_count: i64,
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// Render result rows as CSV (RFC 4180 quoting), sorted by session start then
/// question position. Header is always present.
pub fn interview_results_csv(rows: &[ResultRow]) -> Result<String> {
    let mut sorted: Vec<&ResultRow> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        a.started_at
            .cmp(&b.started_at)
            .then_with(|| a.session_id.cmp(&b.session_id))
            .then_with(|| a.question_position.cmp(&b.question_position))
    });

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(RESULTS_HEADER)?;

    for row in sorted {
        let started_at = row.started_at.to_rfc3339();
        let completed_at = row
            .completed_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let position = row.question_position.to_string();
        let average = row
            .average_score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_default();
        let count = row.evaluation_count.to_string();

        writer.write_record([
            row.session_id.as_str(),
            opt(&row.candidate_name),
            row.candidate_email.as_str(),
            row.status.as_str(),
            started_at.as_str(),
            completed_at.as_str(),
            position.as_str(),
            row.question_prompt.as_str(),
            opt(&row.answer_text),
            opt(&row.media_url),
            average.as_str(),
            count.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::Error::Internal(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| crate::Error::Internal(e.to_string()))
}

/// `content-disposition` filename for an interview export
pub fn results_filename(interview_id: &str) -> String {
    format!("interview-{}-results.csv", interview_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(session: &str, hour: u32, position: i64) -> ResultRow {
        ResultRow {
            session_id: session.to_string(),
            candidate_name: Some("Ada Lovelace".to_string()),
            candidate_email: "ada@example.com".to_string(),
            status: SessionStatus::Completed,
            started_at: Utc.with_ymd_and_hms(2026, 5, 1, hour, 0, 0).unwrap(),
            completed_at: None,
            question_id: format!("q{}", position),
            question_position: position,
            question_prompt: format!("Question {}", position),
            response_id: None,
            answer_text: None,
            media_url: None,
            average_score: None,
            evaluation_count: 0,
        }
    }

    #[test]
    fn test_header_only_when_empty() {
        let csv = interview_results_csv(&[]).unwrap();
        assert_eq!(csv, format!("{}\n", RESULTS_HEADER.join(",")));
    }

    #[test]
    fn test_rows_ordered_by_start_then_position() {
        let rows = vec![
            row("late", 10, 1),
            row("early", 9, 1),
            row("late", 10, 0),
            row("early", 9, 0),
        ];
        let csv = interview_results_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().skip(1).collect();

        assert!(lines[0].starts_with("early,") && lines[0].contains(",Question 0,"));
        assert!(lines[1].starts_with("early,") && lines[1].contains(",Question 1,"));
        assert!(lines[2].starts_with("late,") && lines[2].contains(",Question 0,"));
        assert!(lines[3].starts_with("late,") && lines[3].contains(",Question 1,"));
    }

    #[test]
    fn test_unanswered_and_unscored_cells_are_empty() {
        let csv = interview_results_csv(&[row("s1", 9, 0)]).unwrap();
        let line = csv.lines().nth(1).unwrap();
        // answer_text, media_url, average_score empty; count 0
        assert!(line.ends_with(",Question 0,,,,0"), "line was {}", line);
    }

    #[test]
    fn test_fields_with_commas_and_quotes_are_quoted() {
        let mut r = row("s1", 9, 0);
        r.answer_text = Some("Yes, I said \"hello\"".to_string());
        r.average_score = Some(3.5);
        r.evaluation_count = 2;

        let csv = interview_results_csv(&[r]).unwrap();
        assert!(csv.contains("\"Yes, I said \"\"hello\"\"\""));
        assert!(csv.contains(",3.50,2"));
    }

    #[test]
    fn test_results_filename() {
        assert_eq!(results_filename("abc"), "interview-abc-results.csv");
    }
}
