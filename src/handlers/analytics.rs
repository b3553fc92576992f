// src/handlers/analytics.rs

use axum::{Json, extract::State, response::IntoResponse};
use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::{
    core::analytics::{self, CompletedStat},
    error::AppError,
    utils::clock::Clock,
};

#[derive(Debug, sqlx::FromRow, serde::Serialize)]
struct RecentSession {
    id: String,
    student_name: String,
    grade: i64,
    class_no: i64,
    student_no: i64,
    quiz_title: String,
    score: i64,
    total_questions: i64,
    completed_at: NaiveDateTime,
}

/// Dashboard headline numbers: population counts, the average percentage
/// over the 10 most recent completed sessions and the overall completion
/// rate, plus those recent sessions joined with who took what.
pub async fn analytics_overview(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let (total_quizzes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quiz_schedules")
        .fetch_one(&pool)
        .await?;
    let (total_students,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students")
        .fetch_one(&pool)
        .await?;
    let (total_completed,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM quiz_sessions WHERE completed_at IS NOT NULL",
    )
    .fetch_one(&pool)
    .await?;

    let recent = sqlx::query_as::<_, RecentSession>(
        r#"
        SELECT
            q.id,
            s.name AS student_name,
            s.grade,
            s.class_no,
            s.student_no,
            sc.title AS quiz_title,
            q.score,
            q.total_questions,
            q.completed_at
        FROM quiz_sessions q
        JOIN students s ON s.id = q.student_id
        JOIN quiz_schedules sc ON sc.id = q.schedule_id
        WHERE q.completed_at IS NOT NULL
        ORDER BY q.completed_at DESC
        LIMIT 10
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch recent sessions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let recent_stats: Vec<CompletedStat> = recent
        .iter()
        .map(|r| CompletedStat {
            score: r.score,
            total_questions: r.total_questions,
            completed_at: r.completed_at,
            grade: r.grade,
            class_no: r.class_no,
        })
        .collect();
    let average_score = analytics::average_percentage(&recent_stats);

    let completion_rate = if total_students > 0 {
        (total_completed as f64 / total_students as f64 * 100.0).round() as i64
    } else {
        0
    };

    Ok(Json(serde_json::json!({
        "total_quizzes": total_quizzes,
        "total_students": total_students,
        "average_score": average_score,
        "completion_rate": completion_rate,
        "recent_sessions": recent,
    })))
}

/// Detailed aggregates over every completed session: score distribution
/// across the grading bands, completion counts for the trailing week and
/// per-class averages.
pub async fn detailed_analytics(
    State(pool): State<SqlitePool>,
    State(clock): State<Clock>,
) -> Result<impl IntoResponse, AppError> {
    let stats = sqlx::query_as::<_, CompletedStat>(
        r#"
        SELECT q.score, q.total_questions, q.completed_at, s.grade, s.class_no
        FROM quiz_sessions q
        JOIN students s ON s.id = q.student_id
        WHERE q.completed_at IS NOT NULL
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch session stats: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "score_distribution": analytics::score_distribution(&stats),
        "daily_activity": analytics::daily_activity(&stats, clock.now().date()),
        "class_performance": analytics::class_performance(&stats),
        "total_sessions": stats.len(),
    })))
}
