// src/models/exam.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::QuestionInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    #[default]
    Active,
    Draft,
    Closed,
}

impl ExamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamStatus::Active => "active",
            ExamStatus::Draft => "draft",
            ExamStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ExamStatus::Active),
            "draft" => Some(ExamStatus::Draft),
            "closed" => Some(ExamStatus::Closed),
            _ => None,
        }
    }
}

/// Exam metadata. The question count is not stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: i64,
    pub title: String,
    pub category: String,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub created_by: i64,
    pub status: ExamStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Exam plus the question count derived from the question store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    #[serde(flatten)]
    pub exam: Exam,
    pub total_questions: usize,
}

/// Exam fields the store needs to create one.
#[derive(Debug, Clone)]
pub struct NewExam {
    pub title: String,
    pub category: String,
    pub duration_minutes: u32,
    pub created_by: i64,
    pub status: ExamStatus,
}

/// DTO for creating an exam, optionally with its first question list.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Category is required."))]
    pub category: String,
    #[serde(rename = "duration")]
    #[validate(range(min = 1, max = 600, message = "Duration must be between 1 and 600 minutes."))]
    pub duration_minutes: u32,
    #[serde(default)]
    pub status: ExamStatus,
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}
