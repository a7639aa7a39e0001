// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::{Config, FACE_MATCH_THRESHOLD, MIN_FACE_DESCRIPTOR_LEN},
    error::AppError,
    models::user::{FaceLoginRequest, LoginRequest, NewUser, SignupRequest, UserProfile},
    store::DynRepository,
    utils::{
        face::{cosine_similarity, is_finite_descriptor, round4},
        hash::{hash_password, verify_password},
        json::AppJson,
        jwt::{Claims, sign_jwt},
    },
};

/// Registers a new student or faculty account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with a token and the user (excluding password).
pub async fn signup(
    State(repo): State<DynRepository>,
    State(config): State<Config>,
    AppJson(mut payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.username = payload.username.trim().to_string();
    payload.name = payload.name.trim().to_string();
    payload.validate()?;

    let face_descriptor = payload
        .face_descriptor
        .filter(|d| d.len() >= MIN_FACE_DESCRIPTOR_LEN && is_finite_descriptor(d));

    let user = repo
        .create_user(NewUser {
            username: payload.username,
            email: Some(payload.email),
            password_hash: hash_password(&payload.password)?,
            role: payload.role,
            name: payload.name,
            roll: payload.roll,
            face_descriptor,
        })
        .await?;

    tracing::info!(user_id = user.id, role = user.role.as_str(), "user signed up");

    let token = sign_jwt(&user, &config.jwt_secret, config.jwt_expiration)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "token": token,
            "user": UserProfile::from(&user),
        })),
    ))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown usernames and wrong passwords get the same answer.
pub async fn login(
    State(repo): State<DynRepository>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = repo
        .find_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(&user, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": UserProfile::from(&user),
    })))
}

/// Logs faculty in by comparing a face descriptor with the one stored at signup.
///
/// The descriptor is computed client side; only the cosine similarity is checked here.
pub async fn face_login(
    State(repo): State<DynRepository>,
    State(config): State<Config>,
    AppJson(payload): AppJson<FaceLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::BadRequest("Username is required".to_string()));
    }

    let user = repo
        .find_user_by_username(payload.username.trim())
        .await?
        .filter(|u| u.role.is_staff())
        .ok_or_else(|| AppError::NotFound("Faculty user not found".to_string()))?;

    if payload.face_descriptor.len() < MIN_FACE_DESCRIPTOR_LEN
        || !is_finite_descriptor(&payload.face_descriptor)
    {
        return Err(AppError::BadRequest("Face descriptor missing or invalid".to_string()));
    }

    let stored = user
        .face_descriptor
        .as_deref()
        .filter(|d| d.len() >= MIN_FACE_DESCRIPTOR_LEN)
        .ok_or_else(|| AppError::BadRequest("No face descriptor registered for this user".to_string()))?;

    let similarity = cosine_similarity(stored, &payload.face_descriptor);
    if similarity.is_nan() || similarity < FACE_MATCH_THRESHOLD {
        tracing::warn!(user_id = user.id, similarity, "face verification failed");
        return Err(AppError::AuthError("Face verification failed".to_string()));
    }

    let token = sign_jwt(&user, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "message": "Face login successful",
        "similarity": round4(similarity),
        "token": token,
        "user": UserProfile::from(&user),
    })))
}

/// Returns the current user's profile, falling back to the token claims when the
/// account is no longer in the store.
pub async fn me(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let profile = match repo.find_user_by_id(user_id).await? {
        Some(user) => UserProfile::from(&user),
        None => UserProfile {
            id: user_id,
            username: claims.username.clone(),
            email: None,
            role: claims.role,
            name: claims.username,
            roll: None,
        },
    };

    Ok(Json(profile))
}
