// src/core/mod.rs
//
// Pure domain logic: schedule matching, the session answer log, the tiered
// scoring engine, the ranking projection and the dashboard aggregates.
// Nothing in here touches the
// database or the router; handlers feed rows in and persist what comes out.

pub mod analytics;
pub mod ranking;
pub mod schedule;
pub mod scoring;
pub mod session;
