// src/handlers/question.rs

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{
        ImportTextRequest, PublicQuestion, Question, UploadQuestionsRequest, build_questions,
    },
    services::{pdf, question_parser::parse_questions},
    store::DynRepository,
    utils::{
        json::AppJson,
        jwt::{Claims, StaffUser},
    },
};

/// Returns an exam's questions. Students get them without answer keys.
pub async fn get_questions(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<Response, AppError> {
    let questions = repo.questions_for_exam(exam_id).await?;

    if claims.role.is_staff() {
        return Ok(Json(questions).into_response());
    }

    let public: Vec<PublicQuestion> = questions.into_iter().map(PublicQuestion::from).collect();
    Ok(Json(public).into_response())
}

async fn store_questions(
    repo: &DynRepository,
    exam_id: i64,
    questions: Vec<Question>,
    source: &str,
) -> Result<usize, AppError> {
    let count = repo.replace_questions(exam_id, questions).await?;
    tracing::info!(exam_id, count, source, "question list replaced");
    Ok(count)
}

/// Replaces the exam's question list with the uploaded one.
/// Faculty/Admin only.
pub async fn upload_questions(
    State(repo): State<DynRepository>,
    _staff: StaffUser,
    Path(exam_id): Path<i64>,
    AppJson(payload): AppJson<UploadQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let questions = build_questions(payload.questions).map_err(AppError::BadRequest)?;
    let count = store_questions(&repo, exam_id, questions, "manual").await?;

    Ok(Json(json!({
        "message": "Questions uploaded successfully",
        "count": count,
    })))
}

/// Parses an uploaded PDF (multipart field `file`) and replaces the question list.
/// Faculty/Admin only.
pub async fn upload_pdf(
    State(repo): State<DynRepository>,
    _staff: StaffUser,
    Path(exam_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            file = Some(field.bytes().await?);
            break;
        }
    }
    let file = file.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    if repo.get_exam(exam_id).await?.is_none() {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    let text = pdf::extract_text(file.to_vec()).await?;
    let questions = parse_questions(&text)?;
    let count = store_questions(&repo, exam_id, questions, "pdf").await?;

    Ok(Json(json!({
        "message": "PDF parsed successfully",
        "count": count,
    })))
}

/// Same as the PDF upload, for text that was extracted elsewhere.
/// Faculty/Admin only.
pub async fn import_text(
    State(repo): State<DynRepository>,
    _staff: StaffUser,
    Path(exam_id): Path<i64>,
    AppJson(payload): AppJson<ImportTextRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let questions = parse_questions(&payload.text)?;
    let count = store_questions(&repo, exam_id, questions, "text").await?;

    Ok(Json(json!({
        "message": "Text parsed successfully",
        "count": count,
    })))
}
