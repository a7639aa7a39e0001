// src/services/grading.rs

//! Automatic scoring of MCQ answers and manual evaluation of the rest.

use validator::Validate;

use crate::models::{
    question::Question,
    submission::{Answers, Evaluations, MAX_MANUAL_MARKS, Response, Submission},
};

/// Outcome of automatic grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeReport {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
}

/// `round(score / total * 100)`, or 0 when nothing is gradable.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(score) / f64::from(total) * 100.0).round() as u32
}

/// Scores the submitted answers against the exam's answer key.
///
/// Only MCQ questions with an answer key count towards the total. A question earns
/// one point when the response is exactly its correct option index; text responses
/// and missing answers earn nothing.
pub fn grade(questions: &[Question], answers: &Answers) -> GradeReport {
    let mut score = 0;
    let mut total = 0;

    for question in questions.iter().filter(|q| q.is_auto_gradable()) {
        total += 1;
        let Some(correct) = question.correct_answer_index else {
            continue;
        };
        if let Some(Response::Choice(selected)) = answers.get(&question.id) {
            if usize::try_from(*selected).ok() == Some(correct) {
                score += 1;
            }
        }
    }

    GradeReport {
        score,
        total,
        percentage: percentage(score, total),
    }
}

/// Checks a manual evaluation pass before anything is written.
///
/// Every evaluated id must be a question of the exam, maxMarks must lie in
/// `1..=MAX_MANUAL_MARKS` and marks may not exceed maxMarks.
pub fn validate_evaluations(questions: &[Question], evaluations: &Evaluations) -> Result<(), String> {
    for (question_id, evaluation) in evaluations {
        if !questions.iter().any(|q| q.id == *question_id) {
            return Err(format!("Question {} is not part of this exam", question_id));
        }
        if evaluation.max_marks == 0 || evaluation.max_marks > MAX_MANUAL_MARKS {
            return Err(format!(
                "Question {}: maxMarks must be between 1 and {}",
                question_id, MAX_MANUAL_MARKS
            ));
        }
        evaluation
            .validate()
            .map_err(|e| format!("Question {}: {}", question_id, e))?;
        if let Some(marks) = evaluation.marks {
            if marks > evaluation.max_marks {
                return Err(format!(
                    "Question {}: marks {} exceed maxMarks {}",
                    question_id, marks, evaluation.max_marks
                ));
            }
        }
    }
    Ok(())
}

/// Replaces the submission's manual evaluations and recomputes its totals.
///
/// The score is always rebuilt from the automatic result, so applying the same
/// evaluations twice leaves the submission unchanged. Fails without touching the
/// submission when the sums do not fit.
pub fn apply_manual_evaluation(
    submission: &mut Submission,
    evaluations: Evaluations,
) -> Result<(), String> {
    let overflow = || "Manual marks are too large".to_string();

    let mut score = submission.auto_score;
    let mut total = submission.auto_total;
    for evaluation in evaluations.values() {
        if let Some(marks) = evaluation.marks {
            score = score.checked_add(marks).ok_or_else(overflow)?;
            total = total.checked_add(evaluation.max_marks).ok_or_else(overflow)?;
        }
    }

    submission.score = score;
    submission.total = total;
    submission.percentage = percentage(score, total);
    submission.manual_evaluations = evaluations;
    Ok(())
}
