// src/models/session.rs

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::portfolio::PortfolioView;
use crate::models::question::validate_option_key;

/// One entry in a session's answer log. Re-submitting the same index
/// overwrites the prior entry (last write wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub selected_option: String,
    pub is_correct: bool,
    pub answered_at: NaiveDateTime,
}

/// Answer log keyed by question index within the session's frozen order.
pub type AnswerLog = BTreeMap<u32, AnswerEntry>;

/// Represents the 'quiz_sessions' table in the database.
///
/// One student's single attempt at one schedule's quiz. At most one row
/// exists per (student_id, schedule_id); a row with `completed_at` set is
/// terminal and never mutated again.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizSession {
    pub id: String,
    pub student_id: String,
    pub schedule_id: String,

    /// Question order frozen at creation; resumes must not reshuffle.
    pub question_ids: Json<Vec<String>>,

    pub answers: Json<AnswerLog>,

    /// Count of correct entries in the answer log. Frozen on completion.
    pub score: i64,
    pub total_questions: i64,

    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub time_taken_seconds: Option<i64>,
}

/// DTO for opening (or resuming) a session.
#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub student_id: String,
    pub schedule_id: String,
}

/// DTO for recording one answer.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub question_index: u32,
    #[validate(custom(function = validate_option_key))]
    pub selected_option: String,
}

/// DTO for finishing a session.
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteSessionRequest {
    #[validate(range(min = 0))]
    pub time_taken_seconds: i64,
}

/// Response to a completed session: the frozen score plus the settled
/// portfolio.
#[derive(Debug, Serialize)]
pub struct CompleteSessionResponse {
    pub score: i64,
    pub total_questions: i64,
    pub portfolio: PortfolioView,
}
