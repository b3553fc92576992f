// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, Question},
        schedule::{CreateScheduleRequest, QuizSchedule, ScheduleType, UpdateScheduleRequest},
        student::{CreateStudentRequest, Student},
    },
    utils::clock::Clock,
};

/// Lists all students in the directory.
pub async fn list_students(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let students = sqlx::query_as::<_, Student>(
        "SELECT * FROM students ORDER BY grade, class_no, student_no",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list students: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(students))
}

/// Registers a student into the directory.
pub async fn create_student(
    State(pool): State<SqlitePool>,
    State(clock): State<Clock>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let duplicate: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM students WHERE grade = ? AND class_no = ? AND student_no = ?",
    )
    .bind(payload.grade)
    .bind(payload.class_no)
    .bind(payload.student_no)
    .fetch_optional(&pool)
    .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(format!(
            "Seat {}-{}-{} is already registered",
            payload.grade, payload.class_no, payload.student_no
        )));
    }

    let student = Student {
        id: uuid::Uuid::new_v4().to_string(),
        name: payload.name,
        grade: payload.grade,
        class_no: payload.class_no,
        student_no: payload.student_no,
        phone: payload.phone,
        created_at: clock.now(),
    };

    sqlx::query(
        r#"
        INSERT INTO students (id, name, grade, class_no, student_no, phone, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&student.id)
    .bind(&student.name)
    .bind(student.grade)
    .bind(student.class_no)
    .bind(student.student_no)
    .bind(&student.phone)
    .bind(student.created_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create student: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(student)))
}

/// Lists all questions, answer keys included.
pub async fn list_questions(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let questions =
        sqlx::query_as::<_, Question>("SELECT * FROM questions ORDER BY created_at DESC")
            .fetch_all(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list questions: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

    Ok(Json(questions))
}

/// Creates a new question.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    State(clock): State<Clock>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = Question {
        id: uuid::Uuid::new_v4().to_string(),
        title: payload.title,
        content: payload.content,
        option_a: payload.option_a,
        option_b: payload.option_b,
        option_c: payload.option_c,
        option_d: payload.option_d,
        correct_answer: payload.correct_answer,
        category: payload.category,
        difficulty: payload.difficulty,
        created_at: clock.now(),
    };

    sqlx::query(
        r#"
        INSERT INTO questions
            (id, title, content, option_a, option_b, option_c, option_d,
             correct_answer, category, difficulty, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&question.id)
    .bind(&question.title)
    .bind(&question.content)
    .bind(&question.option_a)
    .bind(&question.option_b)
    .bind(&question.option_c)
    .bind(&question.option_d)
    .bind(&question.correct_answer)
    .bind(&question.category)
    .bind(question.difficulty)
    .bind(question.created_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Deletes a question by ID.
/// Questions referenced by a schedule are immutable and cannot be removed.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (referenced,): (i64,) = sqlx::query_as(
        r#"SELECT COUNT(*) FROM quiz_schedules WHERE question_ids LIKE '%"' || ? || '"%'"#,
    )
    .bind(&id)
    .fetch_one(&pool)
    .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "Question is referenced by a schedule".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(&id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a schedule by ID.
/// A schedule with recorded sessions is part of quiz history and cannot be
/// removed; deactivate it via the update endpoint instead.
pub async fn delete_schedule(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (referenced,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM quiz_sessions WHERE schedule_id = ?")
            .bind(&id)
            .fetch_one(&pool)
            .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "Schedule has recorded sessions".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM quiz_schedules WHERE id = ?")
        .bind(&id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete schedule: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Schedule not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists all schedules, newest first.
pub async fn list_schedules(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let schedules =
        sqlx::query_as::<_, QuizSchedule>("SELECT * FROM quiz_schedules ORDER BY created_at DESC")
            .fetch_all(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list schedules: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

    Ok(Json(schedules))
}

/// Creates a new schedule. Every referenced question must already exist;
/// weekly schedules must carry a non-empty weekday set.
pub async fn create_schedule(
    State(pool): State<SqlitePool>,
    State(clock): State<Clock>,
    Json(payload): Json<CreateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // Use QueryBuilder for dynamic IN clause
    let mut query_builder =
        QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM questions WHERE id IN (");
    let mut separated = query_builder.separated(",");
    for question_id in &payload.question_ids {
        separated.push_bind(question_id);
    }
    separated.push_unseparated(")");

    let (known,): (i64,) = query_builder.build_query_as().fetch_one(&pool).await?;
    if known != payload.question_ids.len() as i64 {
        return Err(AppError::BadRequest(
            "Schedule references an unknown question".to_string(),
        ));
    }

    let weekdays = match payload.schedule_type {
        ScheduleType::Weekly => payload.weekdays.map(SqlJson),
        _ => None,
    };

    let schedule = QuizSchedule {
        id: uuid::Uuid::new_v4().to_string(),
        title: payload.title,
        question_ids: SqlJson(payload.question_ids),
        schedule_type: payload.schedule_type,
        weekdays,
        start_time: payload.start_time,
        end_time: payload.end_time,
        start_date: payload.start_date,
        end_date: payload.end_date,
        time_limit_minutes: payload.time_limit_minutes,
        is_active: true,
        created_at: clock.now(),
    };

    sqlx::query(
        r#"
        INSERT INTO quiz_schedules
            (id, title, question_ids, schedule_type, weekdays, start_time, end_time,
             start_date, end_date, time_limit_minutes, is_active, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&schedule.id)
    .bind(&schedule.title)
    .bind(&schedule.question_ids)
    .bind(schedule.schedule_type)
    .bind(&schedule.weekdays)
    .bind(schedule.start_time)
    .bind(schedule.end_time)
    .bind(schedule.start_date)
    .bind(schedule.end_date)
    .bind(schedule.time_limit_minutes)
    .bind(schedule.is_active)
    .bind(schedule.created_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create schedule: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(schedule)))
}

/// Updates schedule information. Fields are optional; `is_active` is the
/// administrative kill switch.
pub async fn update_schedule(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Check existence
    let _exists: (String,) = sqlx::query_as("SELECT id FROM quiz_schedules WHERE id = ?")
        .bind(&id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;

    // Perform updates sequentially if fields are present
    if let Some(title) = payload.title {
        sqlx::query("UPDATE quiz_schedules SET title = ? WHERE id = ?")
            .bind(title)
            .bind(&id)
            .execute(&pool)
            .await?;
    }

    if let Some(is_active) = payload.is_active {
        sqlx::query("UPDATE quiz_schedules SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(&id)
            .execute(&pool)
            .await?;
    }

    if let Some(start_time) = payload.start_time {
        sqlx::query("UPDATE quiz_schedules SET start_time = ? WHERE id = ?")
            .bind(start_time)
            .bind(&id)
            .execute(&pool)
            .await?;
    }

    if let Some(end_time) = payload.end_time {
        sqlx::query("UPDATE quiz_schedules SET end_time = ? WHERE id = ?")
            .bind(end_time)
            .bind(&id)
            .execute(&pool)
            .await?;
    }

    if let Some(end_date) = payload.end_date {
        sqlx::query("UPDATE quiz_schedules SET end_date = ? WHERE id = ?")
            .bind(end_date)
            .bind(&id)
            .execute(&pool)
            .await?;
    }

    if let Some(time_limit_minutes) = payload.time_limit_minutes {
        sqlx::query("UPDATE quiz_schedules SET time_limit_minutes = ? WHERE id = ?")
            .bind(time_limit_minutes)
            .bind(&id)
            .execute(&pool)
            .await?;
    }

    Ok(StatusCode::OK)
}
