// src/core/analytics.rs

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::prelude::FromRow;

/// One completed session with the student placement needed for grouping.
#[derive(Debug, Clone, FromRow)]
pub struct CompletedStat {
    pub score: i64,
    pub total_questions: i64,
    pub completed_at: NaiveDateTime,
    pub grade: i64,
    pub class_no: i64,
}

impl CompletedStat {
    fn percentage(&self) -> f64 {
        if self.total_questions <= 0 {
            return 0.0;
        }
        self.score as f64 / self.total_questions as f64 * 100.0
    }
}

#[derive(Debug, Serialize)]
pub struct ScoreBucket {
    pub range: &'static str,
    pub count: i64,
}

/// Grading bands the dashboard charts, highest first. Each band's lower
/// bound is inclusive, so the first band a percentage reaches is its bucket.
const SCORE_BANDS: [(&str, f64); 5] = [
    ("90-100%", 90.0),
    ("80-89%", 80.0),
    ("70-79%", 70.0),
    ("60-69%", 60.0),
    ("0-59%", 0.0),
];

/// Histogram of completed sessions over the fixed grading bands.
pub fn score_distribution(stats: &[CompletedStat]) -> Vec<ScoreBucket> {
    let mut buckets: Vec<ScoreBucket> = SCORE_BANDS
        .iter()
        .map(|&(range, _)| ScoreBucket { range, count: 0 })
        .collect();

    for stat in stats {
        let percentage = stat.percentage();
        let slot = SCORE_BANDS
            .iter()
            .position(|(_, min)| percentage >= *min)
            .unwrap_or(SCORE_BANDS.len() - 1);
        buckets[slot].count += 1;
    }
    buckets
}

#[derive(Debug, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub count: i64,
}

/// Completion counts per day for the 7 days ending at `today`, oldest first.
pub fn daily_activity(stats: &[CompletedStat], today: NaiveDate) -> Vec<DailyActivity> {
    (0..7)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let count = stats
                .iter()
                .filter(|stat| stat.completed_at.date() == date)
                .count() as i64;
            DailyActivity { date, count }
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ClassPerformance {
    pub grade: i64,
    pub class_no: i64,
    pub average_score: f64,
    pub sessions: i64,
}

/// Average percentage per (grade, class), rounded to one decimal, ordered by
/// grade then class.
pub fn class_performance(stats: &[CompletedStat]) -> Vec<ClassPerformance> {
    let mut groups: BTreeMap<(i64, i64), (f64, i64)> = BTreeMap::new();
    for stat in stats {
        let entry = groups.entry((stat.grade, stat.class_no)).or_insert((0.0, 0));
        entry.0 += stat.percentage();
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((grade, class_no), (total, sessions))| ClassPerformance {
            grade,
            class_no,
            average_score: (total / sessions as f64 * 10.0).round() / 10.0,
            sessions,
        })
        .collect()
}

/// Mean percentage across `stats`, rounded to one decimal. Empty input is 0.
pub fn average_percentage(stats: &[CompletedStat]) -> f64 {
    if stats.is_empty() {
        return 0.0;
    }
    let total: f64 = stats.iter().map(|stat| stat.percentage()).sum();
    (total / stats.len() as f64 * 10.0).round() / 10.0
}
