// src/models/portfolio.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::core::scoring;

/// Represents the 'portfolios' table in the database.
///
/// One row per student, created lazily on first access. The return rate is
/// deliberately not a column; it is derived from `virtual_assets` on every
/// read so the two can never drift apart.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Portfolio {
    pub student_id: String,
    pub virtual_assets: i64,
    pub created_at: NaiveDateTime,
}

/// Read-side view of a portfolio with the derived return rate.
#[derive(Debug, Serialize)]
pub struct PortfolioView {
    pub student_id: String,
    pub virtual_assets: i64,
    pub total_return_rate: f64,
    pub quizzes_completed: i64,
}

impl PortfolioView {
    pub fn new(portfolio: &Portfolio, quizzes_completed: i64) -> Self {
        PortfolioView {
            student_id: portfolio.student_id.clone(),
            virtual_assets: portfolio.virtual_assets,
            total_return_rate: scoring::return_rate(portfolio.virtual_assets),
            quizzes_completed,
        }
    }
}

/// One row of the recomputed leaderboard. A projection over portfolios and
/// completed-session counts, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct LiveRanking {
    pub rank: i64,
    pub student_id: String,
    pub name: String,
    pub grade: i64,
    pub class_no: i64,
    pub student_no: i64,
    pub virtual_assets: i64,
    pub total_return_rate: f64,
    pub quizzes_completed: i64,
}
