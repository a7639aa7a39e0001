// src/handlers/webauthn.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        passkey::{PasskeyOptionsRequest, VerifyAuthenticationRequest, VerifyRegistrationRequest},
        user::{Role, User, UserProfile},
    },
    services::passkey::{Passkeys, record_use},
    store::DynRepository,
    utils::{
        json::AppJson,
        jwt::{Claims, sign_jwt},
    },
};

/// Passkeys are a faculty-only login method.
async fn find_faculty(repo: &DynRepository, username: &str) -> Result<User, AppError> {
    repo.find_user_by_username(username.trim())
        .await?
        .filter(|u| u.role == Role::Faculty)
        .ok_or_else(|| AppError::BadRequest("Faculty user not found".to_string()))
}

/// Registration needs the faculty member's own session.
async fn find_signed_in_faculty(
    repo: &DynRepository,
    claims: &Claims,
    username: &str,
) -> Result<User, AppError> {
    let user = find_faculty(repo, username).await?;
    if claims.user_id()? != user.id {
        return Err(AppError::Forbidden("Passkeys can only be added to your own account".to_string()));
    }
    Ok(user)
}

pub async fn registration_options(
    State(repo): State<DynRepository>,
    State(passkeys): State<Arc<Passkeys>>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<PasskeyOptionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = find_signed_in_faculty(&repo, &claims, &payload.username).await?;
    let existing = repo.passkeys_for_user(user.id).await?;
    let options = passkeys.start_registration(&user, &existing).await?;

    Ok(Json(options.public_key))
}

pub async fn verify_registration(
    State(repo): State<DynRepository>,
    State(passkeys): State<Arc<Passkeys>>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<VerifyRegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_signed_in_faculty(&repo, &claims, &payload.username).await?;
    let passkey = passkeys.finish_registration(user.id, &payload.att_resp).await?;

    let mut stored = repo.passkeys_for_user(user.id).await?;
    stored.push(passkey);
    repo.save_passkeys(user.id, &stored).await?;

    tracing::info!(user_id = user.id, count = stored.len(), "passkey registered");

    Ok(Json(json!({ "verified": true })))
}

pub async fn authentication_options(
    State(repo): State<DynRepository>,
    State(passkeys): State<Arc<Passkeys>>,
    AppJson(payload): AppJson<PasskeyOptionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = find_faculty(&repo, &payload.username).await?;
    let stored = repo.passkeys_for_user(user.id).await?;
    let options = passkeys.start_authentication(user.id, &stored).await?;

    Ok(Json(options.public_key))
}

/// Verifies a passkey assertion and issues a JWT like the password login does.
pub async fn verify_authentication(
    State(repo): State<DynRepository>,
    State(passkeys): State<Arc<Passkeys>>,
    State(config): State<Config>,
    AppJson(payload): AppJson<VerifyAuthenticationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_faculty(&repo, &payload.username).await?;
    let result = passkeys.finish_authentication(user.id, &payload.auth_resp).await?;

    let mut stored = repo.passkeys_for_user(user.id).await?;
    if record_use(&mut stored, &result) {
        repo.save_passkeys(user.id, &stored).await?;
    }

    tracing::info!(user_id = user.id, "passkey login");

    let token = sign_jwt(&user, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "verified": true,
        "token": token,
        "user": UserProfile::from(&user),
    })))
}
