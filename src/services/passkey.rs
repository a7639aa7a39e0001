// src/services/passkey.rs

//! WebAuthn passkey ceremonies for faculty accounts.
//!
//! Registered passkeys live in the repository. Ceremony state only lives between the
//! "options" call and the matching "verify" call, so it is kept in process memory and
//! consumed by the verify step whether it succeeds or not.

use std::collections::HashMap;

use tokio::sync::Mutex;
use webauthn_rs::prelude::{
    AuthenticationResult, CreationChallengeResponse, Passkey, PasskeyAuthentication,
    PasskeyRegistration, PublicKeyCredential, RegisterPublicKeyCredential,
    RequestChallengeResponse, Url, Uuid, Webauthn, WebauthnBuilder,
};

use crate::{error::AppError, models::user::User};

pub const RP_NAME: &str = "Online Examination Portal";

/// Stable WebAuthn user handle derived from the account id.
pub fn user_handle(user_id: i64) -> Uuid {
    Uuid::from_u64_pair(0, user_id as u64)
}

pub struct Passkeys {
    webauthn: Webauthn,
    registrations: Mutex<HashMap<i64, PasskeyRegistration>>,
    authentications: Mutex<HashMap<i64, PasskeyAuthentication>>,
}

impl Passkeys {
    pub fn new(rp_id: &str, origin: &str) -> Result<Self, AppError> {
        let origin_url = Url::parse(origin).map_err(|e| {
            AppError::InternalServerError(format!("Invalid WebAuthn origin '{}': {}", origin, e))
        })?;

        let webauthn = WebauthnBuilder::new(rp_id, &origin_url)
            .map_err(|e| AppError::InternalServerError(format!("Invalid WebAuthn config: {}", e)))?
            .rp_name(RP_NAME)
            .build()
            .map_err(|e| AppError::InternalServerError(format!("Invalid WebAuthn config: {}", e)))?;

        Ok(Self {
            webauthn,
            registrations: Mutex::new(HashMap::new()),
            authentications: Mutex::new(HashMap::new()),
        })
    }

    /// Options for registering a new passkey. Already registered ones are excluded.
    pub async fn start_registration(
        &self,
        user: &User,
        existing: &[Passkey],
    ) -> Result<CreationChallengeResponse, AppError> {
        let exclude = existing.iter().map(|p| p.cred_id().clone()).collect();

        let (options, state) = self
            .webauthn
            .start_passkey_registration(user_handle(user.id), &user.username, &user.name, Some(exclude))
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to generate registration options: {}", e))
            })?;

        self.registrations.lock().await.insert(user.id, state);
        Ok(options)
    }

    async fn pending_registration(&self, user_id: i64) -> Result<PasskeyRegistration, AppError> {
        self.registrations
            .lock()
            .await
            .remove(&user_id)
            .ok_or_else(|| AppError::BadRequest("No registration in progress".to_string()))
    }

    /// Checks the browser's attestation against the pending registration.
    pub async fn finish_registration(
        &self,
        user_id: i64,
        response: &RegisterPublicKeyCredential,
    ) -> Result<Passkey, AppError> {
        let state = self.pending_registration(user_id).await?;

        self.webauthn
            .finish_passkey_registration(response, &state)
            .map_err(|e| {
                tracing::warn!(user_id, "passkey registration rejected: {}", e);
                AppError::BadRequest("Registration verification failed".to_string())
            })
    }

    /// Options for signing in with one of the user's passkeys.
    pub async fn start_authentication(
        &self,
        user_id: i64,
        passkeys: &[Passkey],
    ) -> Result<RequestChallengeResponse, AppError> {
        if passkeys.is_empty() {
            return Err(AppError::BadRequest("No passkeys registered for this user".to_string()));
        }

        let (options, state) = self
            .webauthn
            .start_passkey_authentication(passkeys)
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to generate authentication options: {}", e))
            })?;

        self.authentications.lock().await.insert(user_id, state);
        Ok(options)
    }

    async fn pending_authentication(&self, user_id: i64) -> Result<PasskeyAuthentication, AppError> {
        self.authentications
            .lock()
            .await
            .remove(&user_id)
            .ok_or_else(|| AppError::BadRequest("No authentication in progress".to_string()))
    }

    /// Checks the browser's assertion against the pending authentication.
    pub async fn finish_authentication(
        &self,
        user_id: i64,
        response: &PublicKeyCredential,
    ) -> Result<AuthenticationResult, AppError> {
        let state = self.pending_authentication(user_id).await?;

        self.webauthn
            .finish_passkey_authentication(response, &state)
            .map_err(|e| {
                tracing::warn!(user_id, "passkey authentication rejected: {}", e);
                AppError::AuthError("Authentication failed".to_string())
            })
    }
}

/// Applies the signature counter of a successful sign-in.
/// Returns true when a stored passkey changed and needs saving.
pub fn record_use(passkeys: &mut [Passkey], result: &AuthenticationResult) -> bool {
    passkeys
        .iter_mut()
        .fold(false, |changed, pk| pk.update_credential(result) == Some(true) || changed)
}
