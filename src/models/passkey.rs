// src/models/passkey.rs

use serde::Deserialize;
use validator::Validate;
use webauthn_rs::prelude::{PublicKeyCredential, RegisterPublicKeyCredential};

/// DTO for requesting registration or authentication options.
#[derive(Debug, Deserialize, Validate)]
pub struct PasskeyOptionsRequest {
    #[validate(length(min = 1, max = 50, message = "Username is required"))]
    pub username: String,
}

/// DTO carrying the browser's attestation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRegistrationRequest {
    pub username: String,
    pub att_resp: RegisterPublicKeyCredential,
}

/// DTO carrying the browser's assertion.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAuthenticationRequest {
    pub username: String,
    pub auth_resp: PublicKeyCredential,
}
