// src/models/submission.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A student's response to one question.
///
/// MCQ answers arrive as the selected option index, coding and short answers as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Choice(i64),
    Text(String),
}

/// Question id -> response.
pub type Answers = BTreeMap<i64, Response>;

/// Upper bound for manual marks, same as the marks a question can carry.
pub const MAX_MANUAL_MARKS: u32 = 100;

/// Marks a grader assigned to one non-objective question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualEvaluation {
    /// Entries without marks are kept but do not count towards the score.
    #[validate(range(max = 100, message = "marks must be at most 100"))]
    pub marks: Option<u32>,
    #[serde(default = "default_max_marks")]
    #[validate(range(min = 1, max = 100, message = "maxMarks must be between 1 and 100"))]
    pub max_marks: u32,
}

fn default_max_marks() -> u32 {
    1
}

/// Question id -> manual evaluation.
pub type Evaluations = BTreeMap<i64, ManualEvaluation>;

/// One graded exam attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub roll_number: Option<String>,
    pub answers: Answers,
    /// Automatic score at submit time. Manual evaluation builds on top of it.
    pub auto_score: u32,
    pub auto_total: u32,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub tab_switches: u32,
    pub manual_evaluations: Evaluations,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Submission fields the store needs to append one.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub exam_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub roll_number: Option<String>,
    pub answers: Answers,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub tab_switches: u32,
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExamRequest {
    #[serde(default)]
    pub answers: Answers,
    #[serde(default)]
    pub tab_switches: u32,
}

/// Result returned to the student right after submitting.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExamResponse {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub tab_switches: u32,
    pub answers: Answers,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub submission_id: i64,
}

impl From<&Submission> for SubmitExamResponse {
    fn from(s: &Submission) -> Self {
        Self {
            score: s.score,
            total: s.total,
            percentage: s.percentage,
            tab_switches: s.tab_switches,
            answers: s.answers.clone(),
            submitted_at: s.submitted_at,
            submission_id: s.id,
        }
    }
}

/// DTO for a manual evaluation pass.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub submission_id: i64,
    #[serde(default)]
    pub evaluations: Evaluations,
}

/// "My submissions" view for a student.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MySubmissions {
    pub completed: usize,
    pub performance: u32,
    pub submissions: Vec<Submission>,
}
