// src/utils/clock.rs

use chrono::{FixedOffset, NaiveDateTime, Utc};

/// Injectable clock so schedule matching can be evaluated at arbitrary
/// instants in tests instead of being coupled to wall-clock time.
///
/// Every schedule and timestamp in the system lives in one canonical zone,
/// configured as a fixed offset from UTC.
#[derive(Debug, Clone)]
pub struct Clock {
    offset: FixedOffset,
    frozen: Option<NaiveDateTime>,
}

impl Clock {
    /// Wall clock shifted into the canonical zone.
    pub fn system(utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        Self {
            offset,
            frozen: None,
        }
    }

    /// A clock frozen at `now`. Used by tests.
    pub fn fixed(now: NaiveDateTime) -> Self {
        Self {
            offset: FixedOffset::east_opt(0).unwrap(),
            frozen: Some(now),
        }
    }

    /// Current naive datetime in the canonical zone.
    pub fn now(&self) -> NaiveDateTime {
        match self.frozen {
            Some(now) => now,
            None => Utc::now().with_timezone(&self.offset).naive_local(),
        }
    }
}
