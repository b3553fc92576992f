// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, analytics, portfolio, quiz, ranking, schedule},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (quiz, portfolio, rankings, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool, Config, Clock).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/", get(schedule::active_quizzes))
        .route("/check", get(quiz::check_taken))
        .route("/results", get(quiz::list_results))
        .route("/sessions", post(quiz::start_session))
        .route("/sessions/{id}/questions", get(quiz::session_questions))
        .route("/sessions/{id}/answers", post(quiz::submit_answer))
        .route("/sessions/{id}/complete", post(quiz::complete_session));

    let portfolio_routes = Router::new()
        .route("/", get(portfolio::get_portfolio))
        .route("/history", get(portfolio::portfolio_history));

    let ranking_routes = Router::new()
        .route("/", get(ranking::get_rankings))
        .route("/top-performers", get(ranking::top_performers));

    let admin_routes = Router::new()
        .route(
            "/students",
            get(admin::list_students).post(admin::create_student),
        )
        .route(
            "/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route("/questions/{id}", delete(admin::delete_question))
        .route(
            "/schedules",
            get(admin::list_schedules).post(admin::create_schedule),
        )
        .route(
            "/schedules/{id}",
            put(admin::update_schedule).delete(admin::delete_schedule),
        )
        .route("/analytics", get(analytics::detailed_analytics))
        .route("/analytics/overview", get(analytics::analytics_overview));

    Router::new()
        .nest("/api/quiz", quiz_routes)
        .nest("/api/portfolio", portfolio_routes)
        .nest("/api/rankings", ranking_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
