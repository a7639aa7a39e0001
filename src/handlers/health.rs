// src/handlers/health.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::store::DynRepository;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "exam-portal-backend",
        "time": chrono::Utc::now(),
    }))
}

/// `db` reports whether a persistent store is in use.
pub async fn health(State(repo): State<DynRepository>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "db": repo.is_persistent(),
        "time": chrono::Utc::now(),
    }))
}
