// src/handlers/ranking.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    core::ranking::{StandingRow, compute_rankings},
    error::AppError,
};

const STANDINGS_QUERY: &str = r#"
SELECT
    s.id AS student_id,
    s.name,
    s.grade,
    s.class_no,
    s.student_no,
    p.virtual_assets,
    p.created_at AS portfolio_created_at,
    (SELECT COUNT(*) FROM quiz_sessions q
       WHERE q.student_id = s.id AND q.completed_at IS NOT NULL) AS quizzes_completed
FROM portfolios p
JOIN students s ON s.id = p.student_id
WHERE 1 = 1
"#;

async fn fetch_standings(
    pool: &SqlitePool,
    grade: Option<i64>,
    class_no: Option<i64>,
) -> Result<Vec<StandingRow>, AppError> {
    let mut query_builder = QueryBuilder::<Sqlite>::new(STANDINGS_QUERY);
    if let Some(grade) = grade {
        query_builder.push(" AND s.grade = ").push_bind(grade);
    }
    if let Some(class_no) = class_no {
        query_builder.push(" AND s.class_no = ").push_bind(class_no);
    }

    query_builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch standings: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })
}

#[derive(Debug, Deserialize)]
pub struct RankingParams {
    pub grade: Option<i64>,
    #[serde(rename = "class")]
    pub class_no: Option<i64>,
    pub limit: Option<usize>,
}

/// The live leaderboard, recomputed from portfolios on every call.
///
/// Grade/class filters are applied before rank assignment, so a class
/// leaderboard always starts at rank 1 rather than being a slice of the
/// global one.
pub async fn get_rankings(
    State(pool): State<SqlitePool>,
    Query(params): Query<RankingParams>,
) -> Result<impl IntoResponse, AppError> {
    let standings = fetch_standings(&pool, params.grade, params.class_no).await?;

    let mut rankings = compute_rankings(standings);
    rankings.truncate(params.limit.unwrap_or(100));

    Ok(Json(rankings))
}

#[derive(Debug, Deserialize)]
pub struct TopPerformersParams {
    pub limit: Option<usize>,
}

#[derive(Debug, sqlx::FromRow)]
struct RecentResult {
    score: i64,
    total_questions: i64,
}

/// The global top of the leaderboard, enriched with each student's recent
/// quiz activity: how many of their last 5 completed sessions exist and the
/// average percentage across them, rounded to one decimal.
pub async fn top_performers(
    State(pool): State<SqlitePool>,
    Query(params): Query<TopPerformersParams>,
) -> Result<impl IntoResponse, AppError> {
    let standings = fetch_standings(&pool, None, None).await?;

    let mut rankings = compute_rankings(standings);
    rankings.truncate(params.limit.unwrap_or(10));

    let mut performers = Vec::with_capacity(rankings.len());
    for entry in rankings {
        let recent = sqlx::query_as::<_, RecentResult>(
            r#"
            SELECT score, total_questions FROM quiz_sessions
            WHERE student_id = ? AND completed_at IS NOT NULL
            ORDER BY completed_at DESC
            LIMIT 5
            "#,
        )
        .bind(&entry.student_id)
        .fetch_all(&pool)
        .await?;

        let average_score = if recent.is_empty() {
            0.0
        } else {
            let total: f64 = recent
                .iter()
                .filter(|r| r.total_questions > 0)
                .map(|r| r.score as f64 / r.total_questions as f64 * 100.0)
                .sum();
            (total / recent.len() as f64 * 10.0).round() / 10.0
        };

        performers.push(serde_json::json!({
            "student": entry,
            "recent_quizzes": recent.len(),
            "average_score": average_score,
        }));
    }

    Ok(Json(performers))
}
