// src/handlers/portfolio.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    core::scoring,
    error::AppError,
    models::portfolio::{Portfolio, PortfolioView},
    utils::clock::Clock,
};

#[derive(Debug, Deserialize)]
pub struct PortfolioParams {
    pub student_id: String,
}

/// Returns a student's portfolio, creating it at the starting balance on
/// first access. The return rate is derived here, never read from storage.
pub async fn get_portfolio(
    State(pool): State<SqlitePool>,
    State(clock): State<Clock>,
    Query(params): Query<PortfolioParams>,
) -> Result<impl IntoResponse, AppError> {
    let student_exists: Option<(String,)> = sqlx::query_as("SELECT id FROM students WHERE id = ?")
        .bind(&params.student_id)
        .fetch_optional(&pool)
        .await?;
    if student_exists.is_none() {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO portfolios (student_id, virtual_assets, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT (student_id) DO NOTHING
        "#,
    )
    .bind(&params.student_id)
    .bind(scoring::STARTING_ASSETS)
    .bind(clock.now())
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create portfolio: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let portfolio = sqlx::query_as::<_, Portfolio>("SELECT * FROM portfolios WHERE student_id = ?")
        .bind(&params.student_id)
        .fetch_one(&pool)
        .await?;

    let (quizzes_completed,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM quiz_sessions WHERE student_id = ? AND completed_at IS NOT NULL",
    )
    .bind(&params.student_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(PortfolioView::new(&portfolio, quizzes_completed)))
}

/// Helper struct for replaying a student's completed results.
#[derive(Debug, sqlx::FromRow, serde::Serialize)]
struct CompletedResult {
    score: i64,
    total_questions: i64,
    completed_at: NaiveDateTime,
}

/// The asset curve a student's portfolio followed, replayed from their
/// completed sessions in completion order. Starts at the fixed balance, so
/// the curve always has one more point than there are sessions.
pub async fn portfolio_history(
    State(pool): State<SqlitePool>,
    Query(params): Query<PortfolioParams>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, CompletedResult>(
        r#"
        SELECT score, total_questions, completed_at FROM quiz_sessions
        WHERE student_id = ? AND completed_at IS NOT NULL
        ORDER BY completed_at ASC
        "#,
    )
    .bind(&params.student_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch session history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let curve = scoring::replay_assets(results.iter().map(|r| (r.score, r.total_questions)));

    Ok(Json(serde_json::json!({
        "portfolio_value": curve,
        "quiz_scores": results,
    })))
}
