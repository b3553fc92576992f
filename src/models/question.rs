// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
/// Questions are immutable once referenced by a schedule's question list.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    pub title: String,

    /// The text content of the question.
    pub content: String,

    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// The correct option key: 'A', 'B', 'C' or 'D'.
    pub correct_answer: String,

    pub category: Option<String>,

    /// Difficulty rating from 1 (easy) to 5 (hard).
    pub difficulty: i64,

    pub created_at: chrono::NaiveDateTime,
}

/// DTO for sending a question to a student mid-quiz (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub title: String,
    pub content: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub category: Option<String>,
    pub difficulty: i64,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            title: q.title,
            content: q.content,
            option_a: q.option_a,
            option_b: q.option_b,
            option_c: q.option_c,
            option_d: q.option_d,
            category: q.category,
            difficulty: q.difficulty,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[validate(length(min = 1, max = 500))]
    pub option_a: String,
    #[validate(length(min = 1, max = 500))]
    pub option_b: String,
    #[validate(length(min = 1, max = 500))]
    pub option_c: String,
    #[validate(length(min = 1, max = 500))]
    pub option_d: String,
    #[validate(custom(function = validate_option_key))]
    pub correct_answer: String,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub difficulty: i64,
}

pub fn validate_option_key(answer: &str) -> Result<(), validator::ValidationError> {
    match answer {
        "A" | "B" | "C" | "D" => Ok(()),
        _ => Err(validator::ValidationError::new("answer_must_be_a_to_d")),
    }
}
