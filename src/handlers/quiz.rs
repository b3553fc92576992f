// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    core::{scoring, session},
    error::AppError,
    models::{
        portfolio::{Portfolio, PortfolioView},
        question::{PublicQuestion, Question},
        schedule::QuizSchedule,
        session::{
            AnswerLog, CompleteSessionRequest, CompleteSessionResponse, QuizSession,
            StartSessionRequest, SubmitAnswerRequest,
        },
    },
    utils::clock::Clock,
};

async fn fetch_session(pool: &SqlitePool, id: &str) -> Result<QuizSession, AppError> {
    sqlx::query_as::<_, QuizSession>("SELECT * FROM quiz_sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz session not found".to_string()))
}

/// Opens a quiz session for a (student, schedule) pair.
///
/// Idempotent: if an in-progress session already exists it is returned
/// unchanged, including the question order frozen when it was first created.
/// A pair that already completed fails with 409. The conditional insert
/// (`ON CONFLICT DO NOTHING` then re-select) means two racing starts cannot
/// produce duplicate sessions.
pub async fn start_session(
    State(pool): State<SqlitePool>,
    State(clock): State<Clock>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = sqlx::query_as::<_, QuizSchedule>("SELECT * FROM quiz_schedules WHERE id = ?")
        .bind(&payload.schedule_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;

    let student_exists: Option<(String,)> =
        sqlx::query_as("SELECT id FROM students WHERE id = ?")
            .bind(&payload.student_id)
            .fetch_optional(&pool)
            .await?;
    if student_exists.is_none() {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    let total_questions = schedule.question_ids.0.len() as i64;

    let inserted = sqlx::query(
        r#"
        INSERT INTO quiz_sessions
            (id, student_id, schedule_id, question_ids, answers, score, total_questions, started_at)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        ON CONFLICT (student_id, schedule_id) DO NOTHING
        "#,
    )
    .bind(&session_id)
    .bind(&payload.student_id)
    .bind(&payload.schedule_id)
    .bind(&schedule.question_ids)
    .bind(SqlJson(AnswerLog::new()))
    .bind(total_questions)
    .bind(clock.now())
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz session: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let existing = sqlx::query_as::<_, QuizSession>(
        "SELECT * FROM quiz_sessions WHERE student_id = ? AND schedule_id = ?",
    )
    .bind(&payload.student_id)
    .bind(&payload.schedule_id)
    .fetch_one(&pool)
    .await?;

    if existing.completed_at.is_some() {
        return Err(AppError::AlreadyCompleted(
            "You already completed this quiz".to_string(),
        ));
    }

    let status = if inserted.rows_affected() == 1 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(existing)))
}

/// Returns the session's questions in its frozen order, answer key stripped.
pub async fn session_questions(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = fetch_session(&pool, &id).await?;

    if session.question_ids.0.is_empty() {
        return Ok(Json(Vec::<PublicQuestion>::new()));
    }

    // Use QueryBuilder for dynamic IN clause
    let mut query_builder =
        QueryBuilder::<Sqlite>::new("SELECT * FROM questions WHERE id IN (");
    let mut separated = query_builder.separated(",");
    for question_id in session.question_ids.0.iter() {
        separated.push_bind(question_id);
    }
    separated.push_unseparated(")");

    let rows: Vec<Question> = query_builder.build_query_as().fetch_all(&pool).await?;
    let mut by_id: HashMap<String, Question> =
        rows.into_iter().map(|q| (q.id.clone(), q)).collect();

    // Reorder to the sequence frozen at session creation.
    let mut questions = Vec::with_capacity(session.question_ids.0.len());
    for question_id in session.question_ids.0.iter() {
        let question = by_id
            .remove(question_id)
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
        questions.push(PublicQuestion::from(question));
    }

    Ok(Json(questions))
}

/// Records one answer against an in-progress session.
///
/// Last write wins per question index, so a student can change an answer any
/// time before completion. The update is guarded on `completed_at IS NULL`
/// so a racing completion always wins over a late answer.
pub async fn submit_answer(
    State(pool): State<SqlitePool>,
    State(clock): State<Clock>,
    Path(id): Path<String>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut quiz_session = fetch_session(&pool, &id).await?;
    if quiz_session.completed_at.is_some() {
        return Err(AppError::AlreadyCompleted(
            "Session already completed".to_string(),
        ));
    }

    let question_id = quiz_session
        .question_ids
        .0
        .get(payload.question_index as usize)
        .ok_or(AppError::InvalidQuestionIndex(payload.question_index))?
        .clone();

    let correct: (String,) =
        sqlx::query_as("SELECT correct_answer FROM questions WHERE id = ?")
            .bind(&question_id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    let score = session::record_answer(
        &mut quiz_session.answers.0,
        payload.question_index,
        quiz_session.total_questions,
        payload.selected_option,
        &correct.0,
        clock.now(),
    )?;
    quiz_session.score = score;

    let updated = sqlx::query(
        "UPDATE quiz_sessions SET answers = ?, score = ? WHERE id = ? AND completed_at IS NULL",
    )
    .bind(&quiz_session.answers)
    .bind(score)
    .bind(&id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record answer: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if updated.rows_affected() == 0 {
        return Err(AppError::AlreadyCompleted(
            "Session already completed".to_string(),
        ));
    }

    Ok(Json(quiz_session))
}

/// Completes a session and settles the portfolio.
///
/// The terminal transition is a conditional update on `completed_at IS
/// NULL`; whichever caller flips it also applies the asset delta, in the
/// same transaction, so the engine can never double-apply and a failed
/// portfolio write rolls the completion back for a clean retry.
pub async fn complete_session(
    State(pool): State<SqlitePool>,
    State(clock): State<Clock>,
    Path(id): Path<String>,
    Json(payload): Json<CompleteSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz_session = fetch_session(&pool, &id).await?;
    if quiz_session.completed_at.is_some() {
        return Err(AppError::AlreadyCompleted(
            "Session already completed".to_string(),
        ));
    }

    // Unanswered questions simply stay out of the log and count as incorrect.
    let score = session::current_score(&quiz_session.answers.0);
    let now = clock.now();

    let mut tx = pool.begin().await?;

    let completed = sqlx::query(
        r#"
        UPDATE quiz_sessions
        SET completed_at = ?, score = ?, time_taken_seconds = ?
        WHERE id = ? AND completed_at IS NULL
        "#,
    )
    .bind(now)
    .bind(score)
    .bind(payload.time_taken_seconds)
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    if completed.rows_affected() == 0 {
        return Err(AppError::AlreadyCompleted(
            "Session already completed".to_string(),
        ));
    }

    let delta = scoring::asset_delta(score, quiz_session.total_questions);
    sqlx::query(
        r#"
        INSERT INTO portfolios (student_id, virtual_assets, created_at)
        VALUES (?, ? + ?, ?)
        ON CONFLICT (student_id) DO UPDATE SET virtual_assets = virtual_assets + ?
        "#,
    )
    .bind(&quiz_session.student_id)
    .bind(scoring::STARTING_ASSETS)
    .bind(delta)
    .bind(now)
    .bind(delta)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to settle portfolio: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let portfolio =
        sqlx::query_as::<_, Portfolio>("SELECT * FROM portfolios WHERE student_id = ?")
            .bind(&quiz_session.student_id)
            .fetch_one(&mut *tx)
            .await?;

    let (quizzes_completed,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM quiz_sessions WHERE student_id = ? AND completed_at IS NOT NULL",
    )
    .bind(&quiz_session.student_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(CompleteSessionResponse {
        score,
        total_questions: quiz_session.total_questions,
        portfolio: PortfolioView::new(&portfolio, quizzes_completed),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    pub student_id: String,
    pub schedule_id: String,
}

/// Whether the student already completed this schedule's quiz. Only
/// `completed_at` matters; an in-progress session does not count as taken.
pub async fn check_taken(
    State(pool): State<SqlitePool>,
    Query(params): Query<CheckParams>,
) -> Result<impl IntoResponse, AppError> {
    let taken: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT id FROM quiz_sessions
        WHERE student_id = ? AND schedule_id = ? AND completed_at IS NOT NULL
        "#,
    )
    .bind(&params.student_id)
    .bind(&params.schedule_id)
    .fetch_optional(&pool)
    .await?;

    Ok(Json(serde_json::json!({ "has_taken": taken.is_some() })))
}

#[derive(Debug, Deserialize)]
pub struct ResultsParams {
    pub student_id: String,
}

/// A student's completed sessions, newest first.
pub async fn list_results(
    State(pool): State<SqlitePool>,
    Query(params): Query<ResultsParams>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = sqlx::query_as::<_, QuizSession>(
        r#"
        SELECT * FROM quiz_sessions
        WHERE student_id = ? AND completed_at IS NOT NULL
        ORDER BY completed_at DESC
        "#,
    )
    .bind(&params.student_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(sessions))
}
