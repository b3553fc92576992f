// src/core/session.rs

use chrono::NaiveDateTime;

use crate::error::AppError;
use crate::models::session::{AnswerEntry, AnswerLog};

/// Records an answer at `index`, overwriting any prior entry at the same
/// index (last write wins), and returns the recomputed score.
///
/// Safe to call repeatedly for the same index; submitting the identical
/// answer twice leaves the score unchanged.
pub fn record_answer(
    log: &mut AnswerLog,
    index: u32,
    total_questions: i64,
    selected_option: String,
    correct_answer: &str,
    answered_at: NaiveDateTime,
) -> Result<i64, AppError> {
    if i64::from(index) >= total_questions {
        return Err(AppError::InvalidQuestionIndex(index));
    }

    let is_correct = selected_option == correct_answer;
    log.insert(
        index,
        AnswerEntry {
            selected_option,
            is_correct,
            answered_at,
        },
    );

    Ok(current_score(log))
}

/// Count of correct entries. An unanswered question has no entry and counts
/// as incorrect, which is not an error.
pub fn current_score(log: &AnswerLog) -> i64 {
    log.values().filter(|entry| entry.is_correct).count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(9, 10, 0)
            .unwrap()
    }

    #[test]
    fn correct_answer_raises_score() {
        let mut log = AnswerLog::new();
        let score = record_answer(&mut log, 0, 10, "B".to_string(), "B", now()).unwrap();
        assert_eq!(score, 1);
        assert!(log.get(&0).unwrap().is_correct);
    }

    #[test]
    fn resubmitting_same_answer_is_idempotent() {
        let mut log = AnswerLog::new();
        record_answer(&mut log, 2, 10, "A".to_string(), "A", now()).unwrap();
        let score = record_answer(&mut log, 2, 10, "A".to_string(), "A", now()).unwrap();
        assert_eq!(score, 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn changing_an_answer_rescores_from_the_latest_entry() {
        let mut log = AnswerLog::new();
        let score = record_answer(&mut log, 0, 10, "C".to_string(), "A", now()).unwrap();
        assert_eq!(score, 0);

        let score = record_answer(&mut log, 0, 10, "A".to_string(), "A", now()).unwrap();
        assert_eq!(score, 1);

        let score = record_answer(&mut log, 0, 10, "D".to_string(), "A", now()).unwrap();
        assert_eq!(score, 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn index_outside_question_count_is_rejected() {
        let mut log = AnswerLog::new();
        let err = record_answer(&mut log, 10, 10, "A".to_string(), "A", now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidQuestionIndex(10)));
        assert!(log.is_empty());
    }

    #[test]
    fn unanswered_questions_count_as_incorrect() {
        let mut log = AnswerLog::new();
        record_answer(&mut log, 0, 3, "A".to_string(), "A", now()).unwrap();
        record_answer(&mut log, 2, 3, "B".to_string(), "C", now()).unwrap();
        // Index 1 was never answered; the score is just the correct count.
        assert_eq!(current_score(&log), 1);
    }
}
