// tests/quiz_flow_tests.rs

use chrono::{NaiveDate, NaiveDateTime};
use quizvest::{config::Config, routes, state::AppState, utils::clock::Clock};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Helper function to spawn the app on a random port for testing, backed by
/// a throwaway SQLite file and a clock frozen at `now`.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app(now: NaiveDateTime) -> String {
    let db_path =
        std::env::temp_dir().join(format!("quizvest_test_{}.db", uuid::Uuid::new_v4()));

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open SQLite test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: db_path.display().to_string(),
        rust_log: "error".to_string(),
        utc_offset_minutes: 0,
    };

    let state = AppState {
        pool,
        config,
        clock: Clock::fixed(now),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// 2026-01-05 is a Monday.
fn monday_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 5)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
}

async fn create_student(client: &reqwest::Client, address: &str, name: &str) -> String {
    create_student_in_class(client, address, name, 1, 1, 1).await
}

async fn create_student_in_class(
    client: &reqwest::Client,
    address: &str,
    name: &str,
    grade: i64,
    class_no: i64,
    student_no: i64,
) -> String {
    let response = client
        .post(format!("{}/api/admin/students", address))
        .json(&serde_json::json!({
            "name": name,
            "grade": grade,
            "class_no": class_no,
            "student_no": student_no
        }))
        .send()
        .await
        .expect("Failed to create student");
    assert_eq!(response.status().as_u16(), 201);
    response.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Creates `count` questions whose correct answer is always "A".
async fn create_questions(client: &reqwest::Client, address: &str, count: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let response = client
            .post(format!("{}/api/admin/questions", address))
            .json(&serde_json::json!({
                "title": format!("Question {}", i + 1),
                "content": "Which option is correct?",
                "option_a": "The right one",
                "option_b": "Wrong",
                "option_c": "Also wrong",
                "option_d": "Still wrong",
                "correct_answer": "A",
                "difficulty": 2
            }))
            .send()
            .await
            .expect("Failed to create question");
        assert_eq!(response.status().as_u16(), 201);
        let id = response.json::<serde_json::Value>().await.unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();
        ids.push(id);
    }
    ids
}

async fn create_daily_schedule(
    client: &reqwest::Client,
    address: &str,
    question_ids: &[String],
) -> String {
    let response = client
        .post(format!("{}/api/admin/schedules", address))
        .json(&serde_json::json!({
            "title": "Morning quiz",
            "question_ids": question_ids,
            "schedule_type": "daily",
            "start_time": "09:00:00",
            "end_time": "09:30:00",
            "start_date": "2026-01-01",
            "time_limit_minutes": 10
        }))
        .send()
        .await
        .expect("Failed to create schedule");
    assert_eq!(response.status().as_u16(), 201);
    response.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn start_session(
    client: &reqwest::Client,
    address: &str,
    student_id: &str,
    schedule_id: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/api/quiz/sessions", address))
        .json(&serde_json::json!({
            "student_id": student_id,
            "schedule_id": schedule_id
        }))
        .send()
        .await
        .expect("Failed to start session")
}

async fn submit_answer(
    client: &reqwest::Client,
    address: &str,
    session_id: &str,
    question_index: u32,
    selected_option: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/api/quiz/sessions/{}/answers", address, session_id))
        .json(&serde_json::json!({
            "question_index": question_index,
            "selected_option": selected_option
        }))
        .send()
        .await
        .expect("Failed to submit answer")
}

async fn complete_session(
    client: &reqwest::Client,
    address: &str,
    session_id: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/api/quiz/sessions/{}/complete", address, session_id))
        .json(&serde_json::json!({ "time_taken_seconds": 120 }))
        .send()
        .await
        .expect("Failed to complete session")
}

#[tokio::test]
async fn no_active_schedule_yields_404() {
    let address = spawn_app(monday_morning()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/quiz", address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn weekly_schedule_is_hidden_on_the_wrong_weekday() {
    // 2026-01-06 is a Tuesday; the schedule runs Mon/Wed/Fri.
    let tuesday = NaiveDate::from_ymd_opt(2026, 1, 6)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    let address = spawn_app(tuesday).await;
    let client = reqwest::Client::new();

    let question_ids = create_questions(&client, &address, 2).await;
    let response = client
        .post(format!("{}/api/admin/schedules", address))
        .json(&serde_json::json!({
            "title": "MWF quiz",
            "question_ids": question_ids,
            "schedule_type": "weekly",
            "weekdays": [1, 3, 5],
            "start_time": "09:00:00",
            "end_time": "09:30:00",
            "start_date": "2026-01-01",
            "time_limit_minutes": 10
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // The time of day matches but the weekday does not.
    let response = client
        .get(format!("{}/api/quiz", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn weekly_schedule_appears_on_a_matching_weekday() {
    // 2026-01-07 is a Wednesday.
    let wednesday = NaiveDate::from_ymd_opt(2026, 1, 7)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    let address = spawn_app(wednesday).await;
    let client = reqwest::Client::new();

    let question_ids = create_questions(&client, &address, 2).await;
    client
        .post(format!("{}/api/admin/schedules", address))
        .json(&serde_json::json!({
            "title": "MWF quiz",
            "question_ids": question_ids,
            "schedule_type": "weekly",
            "weekdays": [1, 3, 5],
            "start_time": "09:00:00",
            "end_time": "09:30:00",
            "start_date": "2026-01-01",
            "time_limit_minutes": 10
        }))
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = client
        .get(format!("{}/api/quiz", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["quizzes"].as_array().unwrap().len(), 1);
    assert_eq!(body["quiz"]["title"], "MWF quiz");
}

#[tokio::test]
async fn weekly_schedule_without_weekdays_is_rejected() {
    let address = spawn_app(monday_morning()).await;
    let client = reqwest::Client::new();

    let question_ids = create_questions(&client, &address, 1).await;
    let response = client
        .post(format!("{}/api/admin/schedules", address))
        .json(&serde_json::json!({
            "title": "Broken weekly",
            "question_ids": question_ids,
            "schedule_type": "weekly",
            "start_time": "09:00:00",
            "end_time": "09:30:00",
            "start_date": "2026-01-01",
            "time_limit_minutes": 10
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn full_quiz_flow_settles_the_portfolio() {
    let address = spawn_app(monday_morning()).await;
    let client = reqwest::Client::new();

    let student_id = create_student(&client, &address, "Jiho").await;
    let question_ids = create_questions(&client, &address, 10).await;
    let schedule_id = create_daily_schedule(&client, &address, &question_ids).await;

    // The daily schedule is open right now.
    let body: serde_json::Value = client
        .get(format!("{}/api/quiz", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["quizzes"].as_array().unwrap().len(), 1);

    let response = start_session(&client, &address, &student_id, &schedule_id).await;
    assert_eq!(response.status().as_u16(), 201);
    let session: serde_json::Value = response.json().await.unwrap();
    let session_id = session["id"].as_str().unwrap().to_string();
    assert_eq!(session["total_questions"], 10);

    // 8 correct, 2 wrong -> 80%.
    for index in 0..8u32 {
        let response = submit_answer(&client, &address, &session_id, index, "A").await;
        assert_eq!(response.status().as_u16(), 200);
    }
    for index in 8..10u32 {
        submit_answer(&client, &address, &session_id, index, "B").await;
    }

    let response = complete_session(&client, &address, &session_id).await;
    assert_eq!(response.status().as_u16(), 200);
    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["score"], 8);
    assert_eq!(result["total_questions"], 10);
    assert_eq!(result["portfolio"]["virtual_assets"], 1_030_000);
    let rate = result["portfolio"]["total_return_rate"].as_f64().unwrap();
    assert!((rate - 3.0).abs() < 1e-9);
    assert_eq!(result["portfolio"]["quizzes_completed"], 1);

    // The quiz now counts as taken.
    let check: serde_json::Value = client
        .get(format!(
            "{}/api/quiz/check?student_id={}&schedule_id={}",
            address, student_id, schedule_id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(check["has_taken"], true);

    // Restarting a completed quiz fails.
    let response = start_session(&client, &address, &student_id, &schedule_id).await;
    assert_eq!(response.status().as_u16(), 409);

    // Completing again fails too; the portfolio is untouched.
    let response = complete_session(&client, &address, &session_id).await;
    assert_eq!(response.status().as_u16(), 409);

    let portfolio: serde_json::Value = client
        .get(format!("{}/api/portfolio?student_id={}", address, student_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(portfolio["virtual_assets"], 1_030_000);

    let results: serde_json::Value = client
        .get(format!("{}/api/quiz/results?student_id={}", address, student_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn starting_twice_resumes_the_same_session() {
    let address = spawn_app(monday_morning()).await;
    let client = reqwest::Client::new();

    let student_id = create_student(&client, &address, "Minseo").await;
    let question_ids = create_questions(&client, &address, 3).await;
    let schedule_id = create_daily_schedule(&client, &address, &question_ids).await;

    let first = start_session(&client, &address, &student_id, &schedule_id).await;
    assert_eq!(first.status().as_u16(), 201);
    let first: serde_json::Value = first.json().await.unwrap();

    // Answer one question, then "come back" to the quiz.
    let first_id = first["id"].as_str().unwrap();
    submit_answer(&client, &address, first_id, 0, "A").await;

    let second = start_session(&client, &address, &student_id, &schedule_id).await;
    assert_eq!(second.status().as_u16(), 200);
    let second: serde_json::Value = second.json().await.unwrap();

    assert_eq!(first["id"], second["id"]);
    // The resumed session kept its answer log and frozen question order.
    assert_eq!(second["score"], 1);
    assert_eq!(second["question_ids"], first["question_ids"]);
}

#[tokio::test]
async fn answers_are_idempotent_and_last_write_wins() {
    let address = spawn_app(monday_morning()).await;
    let client = reqwest::Client::new();

    let student_id = create_student(&client, &address, "Seojun").await;
    let question_ids = create_questions(&client, &address, 2).await;
    let schedule_id = create_daily_schedule(&client, &address, &question_ids).await;

    let session: serde_json::Value = start_session(&client, &address, &student_id, &schedule_id)
        .await
        .json()
        .await
        .unwrap();
    let session_id = session["id"].as_str().unwrap().to_string();

    // Correct answer.
    let body: serde_json::Value = submit_answer(&client, &address, &session_id, 0, "A")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["score"], 1);

    // Submitting the identical answer changes nothing.
    let body: serde_json::Value = submit_answer(&client, &address, &session_id, 0, "A")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["score"], 1);

    // Changing the answer rescores from the latest entry only.
    let body: serde_json::Value = submit_answer(&client, &address, &session_id, 0, "C")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["score"], 0);

    // Out-of-range index.
    let response = submit_answer(&client, &address, &session_id, 5, "A").await;
    assert_eq!(response.status().as_u16(), 400);

    // Unknown session.
    let response = submit_answer(&client, &address, "no-such-session", 0, "A").await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn unanswered_questions_score_as_incorrect() {
    let address = spawn_app(monday_morning()).await;
    let client = reqwest::Client::new();

    let student_id = create_student(&client, &address, "Yuna").await;
    let question_ids = create_questions(&client, &address, 5).await;
    let schedule_id = create_daily_schedule(&client, &address, &question_ids).await;

    let session: serde_json::Value = start_session(&client, &address, &student_id, &schedule_id)
        .await
        .json()
        .await
        .unwrap();
    let session_id = session["id"].as_str().unwrap().to_string();

    // Answer 4 of 5 correctly and leave the last one blank: 80%.
    for index in 0..4u32 {
        submit_answer(&client, &address, &session_id, index, "A").await;
    }

    let result: serde_json::Value = complete_session(&client, &address, &session_id)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(result["score"], 4);
    assert_eq!(result["portfolio"]["virtual_assets"], 1_030_000);
}

#[tokio::test]
async fn session_questions_come_in_frozen_order_without_answer_keys() {
    let address = spawn_app(monday_morning()).await;
    let client = reqwest::Client::new();

    let student_id = create_student(&client, &address, "Haeun").await;
    let question_ids = create_questions(&client, &address, 4).await;
    let schedule_id = create_daily_schedule(&client, &address, &question_ids).await;

    let session: serde_json::Value = start_session(&client, &address, &student_id, &schedule_id)
        .await
        .json()
        .await
        .unwrap();
    let session_id = session["id"].as_str().unwrap();

    let questions: serde_json::Value = client
        .get(format!("{}/api/quiz/sessions/{}/questions", address, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let questions = questions.as_array().unwrap();
    assert_eq!(questions.len(), 4);
    for (i, question) in questions.iter().enumerate() {
        assert_eq!(question["id"].as_str().unwrap(), question_ids[i]);
        assert!(question.get("correct_answer").is_none());
    }
}
