// src/handlers/mod.rs

pub mod admin;
pub mod analytics;
pub mod portfolio;
pub mod quiz;
pub mod ranking;
pub mod schedule;
