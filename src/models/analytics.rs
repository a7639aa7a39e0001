// src/models/analytics.rs

use serde::Serialize;

use crate::models::submission::Submission;

/// Aggregated results for one exam.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAnalytics {
    pub exam_id: i64,
    pub total_submissions: usize,
    /// Mean percentage, rounded.
    pub average_score: u32,
    pub pass_count: usize,
    pub fail_count: usize,
    pub pass_rate: u32,
    pub submissions: Vec<Submission>,
}

/// One spreadsheet row of the results export.
#[derive(Debug, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Student Name")]
    pub student_name: String,
    #[serde(rename = "Roll Number")]
    pub roll_number: String,
    #[serde(rename = "Score")]
    pub score: u32,
    #[serde(rename = "Total")]
    pub total: u32,
    #[serde(rename = "Percentage")]
    pub percentage: String,
    #[serde(rename = "Tab Switches")]
    pub tab_switches: u32,
    #[serde(rename = "Submitted At")]
    pub submitted_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub exam_title: String,
    pub data: Vec<ExportRow>,
}
