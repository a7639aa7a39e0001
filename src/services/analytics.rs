// src/services/analytics.rs

use crate::{
    config::PASS_PERCENTAGE,
    models::{
        analytics::{ExamAnalytics, ExportResponse, ExportRow},
        submission::{MySubmissions, Submission},
    },
};

fn rounded_ratio(part: f64, whole: f64) -> u32 {
    if whole == 0.0 {
        return 0;
    }
    (part / whole).round() as u32
}

fn mean_percentage(submissions: &[Submission]) -> u32 {
    let sum: u64 = submissions.iter().map(|s| u64::from(s.percentage)).sum();
    rounded_ratio(sum as f64, submissions.len() as f64)
}

/// Summarizes all submissions of one exam.
pub fn exam_analytics(exam_id: i64, submissions: Vec<Submission>) -> ExamAnalytics {
    let total_submissions = submissions.len();
    let pass_count = submissions
        .iter()
        .filter(|s| s.percentage >= PASS_PERCENTAGE)
        .count();

    ExamAnalytics {
        exam_id,
        total_submissions,
        average_score: mean_percentage(&submissions),
        pass_count,
        fail_count: total_submissions - pass_count,
        pass_rate: rounded_ratio(pass_count as f64 * 100.0, total_submissions as f64),
        submissions,
    }
}

/// A student's completed attempts and their mean percentage.
pub fn my_submissions(submissions: Vec<Submission>) -> MySubmissions {
    MySubmissions {
        completed: submissions.len(),
        performance: mean_percentage(&submissions),
        submissions,
    }
}

/// Spreadsheet-style rows for exporting an exam's results.
pub fn export_rows(exam_title: String, submissions: &[Submission]) -> ExportResponse {
    let data = submissions
        .iter()
        .map(|s| ExportRow {
            student_name: s.student_name.clone(),
            roll_number: s.roll_number.clone().unwrap_or_else(|| "N/A".to_string()),
            score: s.score,
            total: s.total,
            percentage: format!("{}%", s.percentage),
            tab_switches: s.tab_switches,
            submitted_at: s.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    ExportResponse {
        exam_title,
        data,
    }
}
