// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::{CreateExamRequest, ExamSummary, NewExam},
        question::build_questions,
    },
    store::DynRepository,
    utils::{
        json::AppJson,
        jwt::{Claims, StaffUser},
    },
};

/// Lists all exams with their current question counts.
pub async fn list_exams(
    State(repo): State<DynRepository>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(repo.list_exams().await?))
}

pub async fn get_exam(
    State(repo): State<DynRepository>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = repo
        .get_exam(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(exam))
}

/// Creates an exam, optionally with its first question list.
/// Faculty/Admin only.
pub async fn create_exam(
    State(repo): State<DynRepository>,
    StaffUser(claims): StaffUser,
    AppJson(payload): AppJson<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let questions = build_questions(payload.questions).map_err(AppError::BadRequest)?;

    let exam = repo
        .create_exam(
            NewExam {
                title: payload.title.trim().to_string(),
                category: payload.category.trim().to_string(),
                duration_minutes: payload.duration_minutes,
                created_by: claims.user_id()?,
                status: payload.status,
            },
            questions,
        )
        .await?;

    tracing::info!(exam_id = exam.id, created_by = exam.created_by, "exam created");

    let summary: ExamSummary = repo
        .get_exam(exam.id)
        .await?
        .ok_or_else(|| AppError::InternalServerError("Created exam vanished".to_string()))?;

    Ok((StatusCode::CREATED, Json(summary)))
}
