// src/models/schedule.rs

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Recurrence of a quiz window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ScheduleType {
    Daily,
    Weekly,
    Once,
}

/// Represents the 'quiz_schedules' table in the database.
///
/// A recurring or one-off time window during which a fixed question set may
/// be attempted. `weekdays` uses Sunday = 0 indexing and is only meaningful
/// for weekly schedules.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizSchedule {
    pub id: String,
    pub title: String,

    /// Ordered question ids, stored as a JSON array.
    pub question_ids: Json<Vec<String>>,

    pub schedule_type: ScheduleType,
    pub weekdays: Option<Json<Vec<u8>>>,

    /// Inclusive time-of-day bounds within the canonical zone.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,

    /// Inclusive calendar bounds; an absent end date means unbounded future.
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,

    pub time_limit_minutes: i64,

    /// Administrative kill switch, independent of time matching.
    pub is_active: bool,

    pub created_at: NaiveDateTime,
}

/// DTO for creating a new schedule.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_schedule_rules))]
pub struct CreateScheduleRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, message = "A schedule needs at least one question."))]
    pub question_ids: Vec<String>,
    pub schedule_type: ScheduleType,
    pub weekdays: Option<Vec<u8>>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 180))]
    pub time_limit_minutes: i64,
}

/// Weekly schedules must carry a non-empty set of valid weekday indices.
fn validate_schedule_rules(req: &CreateScheduleRequest) -> Result<(), validator::ValidationError> {
    if req.schedule_type == ScheduleType::Weekly {
        match &req.weekdays {
            Some(days) if !days.is_empty() => {
                if days.iter().any(|d| *d > 6) {
                    return Err(validator::ValidationError::new("weekday_out_of_range"));
                }
            }
            _ => return Err(validator::ValidationError::new("weekly_requires_weekdays")),
        }
    }
    Ok(())
}

/// DTO for updating a schedule. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub title: Option<String>,
    pub is_active: Option<bool>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub time_limit_minutes: Option<i64>,
}
