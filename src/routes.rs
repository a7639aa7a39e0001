// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, exam, health, question, submission, webauthn},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Uploaded PDFs may be larger than axum's default body limit.
const PDF_UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

fn cors_layer(origin: &str) -> CorsLayer {
    let origin = origin.parse::<HeaderValue>().unwrap_or_else(|_| {
        tracing::warn!("Invalid FRONTEND_ORIGIN '{}', falling back to localhost", origin);
        HeaderValue::from_static("http://localhost:3000")
    });

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Public routes: status, signup and the login flows (password, face, passkey).
/// * Everything under the protected router requires a bearer token; staff-only
///   handlers additionally check the role through the `StaffUser` extractor.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(health::root))
        .route("/api/health", get(health::health))
        .route("/api/signup", post(auth::signup))
        .route("/api/login", post(auth::login))
        .route("/api/face-login", post(auth::face_login))
        .route(
            "/api/webauthn/generate-authentication-options",
            post(webauthn::authentication_options),
        )
        .route(
            "/api/webauthn/verify-authentication",
            post(webauthn::verify_authentication),
        );

    let exam_routes = Router::new()
        .route("/", get(exam::list_exams).post(exam::create_exam))
        .route("/{id}", get(exam::get_exam))
        .route(
            "/{id}/questions",
            get(question::get_questions).post(question::upload_questions),
        )
        .route(
            "/{id}/questions/upload-pdf",
            post(question::upload_pdf).layer(DefaultBodyLimit::max(PDF_UPLOAD_LIMIT)),
        )
        .route("/{id}/questions/import-text", post(question::import_text))
        .route("/{id}/submit", post(submission::submit_exam))
        .route("/{id}/submissions", get(submission::list_submissions))
        .route("/{id}/analytics", get(submission::get_analytics))
        .route("/{id}/evaluate", post(submission::evaluate_submission))
        .route("/{id}/export/excel", get(submission::export_results));

    let protected_routes = Router::new()
        .route("/api/me", get(auth::me))
        .route("/api/my/submissions", get(submission::my_submissions))
        .route(
            "/api/webauthn/generate-registration-options",
            post(webauthn::registration_options),
        )
        .route("/api/webauthn/verify-registration", post(webauthn::verify_registration))
        .nest("/api/exams", exam_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config.frontend_origin);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
