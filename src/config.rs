// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    /// Canonical time zone of every schedule and timestamp, expressed as a
    /// fixed offset from UTC in minutes. Defaults to +540 (KST).
    pub utc_offset_minutes: i32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let utc_offset_minutes = env::var("UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(540);

        Self {
            database_url,
            rust_log,
            utc_offset_minutes,
        }
    }
}
