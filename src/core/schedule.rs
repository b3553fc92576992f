// src/core/schedule.rs

use chrono::{Datelike, NaiveDateTime};

use crate::models::schedule::{QuizSchedule, ScheduleType};

/// Whether a single schedule is open for attempts at `now`.
///
/// All four gates must hold: the administrative `is_active` flag, the
/// inclusive calendar range, the inclusive time-of-day range and the
/// type-specific day match. A window with `end_time < start_time` does not
/// wrap past midnight; it simply never matches.
pub fn is_open(schedule: &QuizSchedule, now: NaiveDateTime) -> bool {
    if !schedule.is_active {
        return false;
    }

    let today = now.date();
    if today < schedule.start_date {
        return false;
    }
    if let Some(end_date) = schedule.end_date {
        if today > end_date {
            return false;
        }
    }

    let time_of_day = now.time();
    if time_of_day < schedule.start_time || time_of_day > schedule.end_time {
        return false;
    }

    match schedule.schedule_type {
        ScheduleType::Daily => true,
        ScheduleType::Weekly => {
            // Sunday = 0, matching the weekday indexing stored on the row.
            let weekday = today.weekday().num_days_from_sunday() as u8;
            schedule
                .weekdays
                .as_ref()
                .map(|days| days.0.contains(&weekday))
                .unwrap_or(false)
        }
        ScheduleType::Once => today == schedule.start_date,
    }
}

/// Filters `schedules` down to those open at `now`, most recently created
/// first. Pure and cheap; evaluated on every "what's active" query rather
/// than cached.
pub fn active_schedules(now: NaiveDateTime, mut schedules: Vec<QuizSchedule>) -> Vec<QuizSchedule> {
    schedules.retain(|s| is_open(s, now));
    // Stable sort keeps insertion order for equal creation timestamps.
    schedules.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    schedules
}
