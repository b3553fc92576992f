// src/handlers/schedule.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    core::schedule::active_schedules, error::AppError, models::schedule::QuizSchedule,
    utils::clock::Clock,
};

/// Returns the schedules currently open for attempts.
///
/// The matcher is evaluated synchronously against the injected clock on
/// every request; nothing is cached. 404 when no schedule is open, matching
/// what the student UI expects. The first (most recently created) schedule
/// is also exposed under `quiz` for older clients.
pub async fn active_quizzes(
    State(pool): State<SqlitePool>,
    State(clock): State<Clock>,
) -> Result<impl IntoResponse, AppError> {
    let schedules = sqlx::query_as::<_, QuizSchedule>(
        "SELECT * FROM quiz_schedules WHERE is_active = 1 ORDER BY created_at DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch schedules: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let open = active_schedules(clock.now(), schedules);
    if open.is_empty() {
        return Err(AppError::NoActiveSchedule);
    }

    Ok(Json(serde_json::json!({
        "quizzes": open,
        "quiz": open[0],
    })))
}
