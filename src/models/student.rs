// src/models/student.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'students' table in the database.
/// The student directory: identity plus grade/class/number placement.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub grade: i64,
    pub class_no: i64,
    pub student_no: i64,
    pub phone: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

/// DTO for registering a student into the directory.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 50, message = "Name length must be between 1 and 50 characters."))]
    pub name: String,
    #[validate(range(min = 1, max = 6))]
    pub grade: i64,
    #[validate(range(min = 1, max = 20))]
    pub class_no: i64,
    #[validate(range(min = 1, max = 50))]
    pub student_no: i64,
    pub phone: Option<String>,
}
