// src/models/mod.rs

pub mod portfolio;
pub mod question;
pub mod schedule;
pub mod session;
pub mod student;
