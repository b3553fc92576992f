// src/utils/mod.rs

pub mod clock;
