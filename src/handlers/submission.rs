// src/handlers/submission.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        exam::ExamSummary,
        submission::{EvaluateRequest, NewSubmission, SubmitExamRequest, SubmitExamResponse},
    },
    services::{analytics, grading},
    store::DynRepository,
    utils::{
        json::AppJson,
        jwt::{Claims, StaffUser},
    },
};

async fn find_exam(repo: &DynRepository, exam_id: i64) -> Result<ExamSummary, AppError> {
    repo.get_exam(exam_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))
}

/// Submits a student's answers, grades the MCQ part and stores the attempt.
///
/// Coding and short answers are stored for manual evaluation.
pub async fn submit_exam(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
    AppJson(req): AppJson<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    find_exam(&repo, exam_id).await?;

    let student_id = claims.user_id()?;
    let questions = repo.questions_for_exam(exam_id).await?;
    let report = grading::grade(&questions, &req.answers);

    let student = repo.find_user_by_id(student_id).await?;
    let (student_name, roll_number) = match student {
        Some(user) => (user.name, user.roll),
        None => (claims.username.clone(), None),
    };

    let submission = repo
        .insert_submission(NewSubmission {
            exam_id,
            student_id,
            student_name,
            roll_number,
            answers: req.answers,
            score: report.score,
            total: report.total,
            percentage: report.percentage,
            tab_switches: req.tab_switches,
        })
        .await?;

    tracing::info!(
        submission_id = submission.id,
        exam_id,
        student_id,
        score = report.score,
        total = report.total,
        tab_switches = submission.tab_switches,
        "exam submitted"
    );

    Ok(Json(SubmitExamResponse::from(&submission)))
}

/// All submissions for an exam.
/// Faculty/Admin only.
pub async fn list_submissions(
    State(repo): State<DynRepository>,
    _staff: StaffUser,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    find_exam(&repo, exam_id).await?;
    Ok(Json(repo.submissions_for_exam(exam_id).await?))
}

/// Pass/fail statistics for an exam.
/// Faculty/Admin only.
pub async fn get_analytics(
    State(repo): State<DynRepository>,
    _staff: StaffUser,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    find_exam(&repo, exam_id).await?;
    let submissions = repo.submissions_for_exam(exam_id).await?;
    Ok(Json(analytics::exam_analytics(exam_id, submissions)))
}

/// The calling student's submissions and average percentage.
pub async fn my_submissions(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let submissions = repo.submissions_for_student(claims.user_id()?).await?;
    Ok(Json(analytics::my_submissions(submissions)))
}

/// Applies a manual evaluation pass to one submission.
///
/// Each call replaces the previous manual marks. Faculty/Admin only.
pub async fn evaluate_submission(
    State(repo): State<DynRepository>,
    StaffUser(claims): StaffUser,
    Path(exam_id): Path<i64>,
    AppJson(req): AppJson<EvaluateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut submission = repo
        .get_submission(req.submission_id)
        .await?
        .filter(|s| s.exam_id == exam_id)
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    let questions = repo.questions_for_exam(exam_id).await?;
    grading::validate_evaluations(&questions, &req.evaluations).map_err(AppError::BadRequest)?;

    grading::apply_manual_evaluation(&mut submission, req.evaluations)
        .map_err(AppError::BadRequest)?;
    repo.update_evaluation(&submission).await?;

    tracing::info!(
        submission_id = submission.id,
        evaluated_by = %claims.sub,
        score = submission.score,
        total = submission.total,
        "manual evaluation applied"
    );

    Ok(Json(submission))
}

/// Results of an exam as spreadsheet rows.
/// Faculty/Admin only.
pub async fn export_results(
    State(repo): State<DynRepository>,
    _staff: StaffUser,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = find_exam(&repo, exam_id).await?;
    let submissions = repo.submissions_for_exam(exam_id).await?;

    Ok(Json(analytics::export_rows(exam.exam.title, &submissions)))
}
