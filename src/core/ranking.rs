// src/core/ranking.rs

use chrono::NaiveDateTime;
use sqlx::prelude::FromRow;

use crate::core::scoring;
use crate::models::portfolio::LiveRanking;

/// One student's raw standing before rank assignment: identity, portfolio
/// state and completed-session count, as joined out of the store.
#[derive(Debug, Clone, FromRow)]
pub struct StandingRow {
    pub student_id: String,
    pub name: String,
    pub grade: i64,
    pub class_no: i64,
    pub student_no: i64,
    pub virtual_assets: i64,
    pub portfolio_created_at: NaiveDateTime,
    pub quizzes_completed: i64,
}

/// Projects raw standings into the ordered leaderboard.
///
/// Pull model: fully recomputed from the rows handed in, never maintained
/// incrementally. Rows are ordered by assets descending with ties broken by
/// earliest portfolio creation; `rank = 1 + count of strictly richer
/// students`, so tied students share a rank (competition ranking). Any
/// grade/class filtering must happen before this call so a filtered
/// leaderboard starts at rank 1.
pub fn compute_rankings(mut rows: Vec<StandingRow>) -> Vec<LiveRanking> {
    rows.sort_by(|a, b| {
        b.virtual_assets
            .cmp(&a.virtual_assets)
            .then(a.portfolio_created_at.cmp(&b.portfolio_created_at))
    });

    let mut rankings = Vec::with_capacity(rows.len());
    let mut rank = 1;
    for (position, row) in rows.iter().enumerate() {
        // Sorted descending, so only the previous row can change the rank.
        if position > 0 && row.virtual_assets < rows[position - 1].virtual_assets {
            rank = position as i64 + 1;
        }
        rankings.push(LiveRanking {
            rank,
            student_id: row.student_id.clone(),
            name: row.name.clone(),
            grade: row.grade,
            class_no: row.class_no,
            student_no: row.student_no,
            virtual_assets: row.virtual_assets,
            total_return_rate: scoring::return_rate(row.virtual_assets),
            quizzes_completed: row.quizzes_completed,
        });
    }
    rankings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(student_id: &str, assets: i64, created_minute: u32) -> StandingRow {
        StandingRow {
            student_id: student_id.to_string(),
            name: student_id.to_string(),
            grade: 1,
            class_no: 1,
            student_no: 1,
            virtual_assets: assets,
            portfolio_created_at: NaiveDate::from_ymd_opt(2026, 1, 5)
                .unwrap()
                .and_hms_opt(9, created_minute, 0)
                .unwrap(),
            quizzes_completed: 0,
        }
    }

    #[test]
    fn orders_by_assets_descending() {
        let rankings = compute_rankings(vec![
            row("low", 990_000, 0),
            row("high", 1_050_000, 1),
            row("mid", 1_030_000, 2),
        ]);
        let order: Vec<&str> = rankings.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
        assert_eq!(rankings[0].rank, 1);
        assert_eq!(rankings[1].rank, 2);
        assert_eq!(rankings[2].rank, 3);
    }

    #[test]
    fn ties_share_a_rank_and_the_next_rank_skips() {
        let rankings = compute_rankings(vec![
            row("a", 1_030_000, 0),
            row("b", 1_030_000, 1),
            row("c", 1_000_000, 2),
        ]);
        assert_eq!(rankings[0].rank, 1);
        assert_eq!(rankings[1].rank, 1);
        assert_eq!(rankings[2].rank, 3);
    }

    #[test]
    fn earliest_created_portfolio_wins_the_tie_order() {
        let rankings = compute_rankings(vec![
            row("late", 1_030_000, 30),
            row("early", 1_030_000, 10),
        ]);
        let order: Vec<&str> = rankings.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(order, vec!["early", "late"]);
    }

    #[test]
    fn return_rate_is_derived_from_assets() {
        let rankings = compute_rankings(vec![row("a", 1_030_000, 0)]);
        assert_eq!(rankings[0].total_return_rate, 3.0);
    }

    #[test]
    fn empty_input_yields_empty_leaderboard() {
        assert!(compute_rankings(Vec::new()).is_empty());
    }
}
