// src/state.rs

use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::passkey::Passkeys;
use crate::store::DynRepository;
use axum::extract::FromRef;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: DynRepository,
    pub config: Config,
    pub passkeys: Arc<Passkeys>,
}

impl AppState {
    /// Builds the state, setting up WebAuthn from the configured relying party.
    pub fn new(repo: DynRepository, config: Config) -> Result<Self, AppError> {
        let passkeys = Passkeys::new(&config.webauthn_rp_id, &config.webauthn_origin)?;
        Ok(Self {
            repo,
            config,
            passkeys: Arc::new(passkeys),
        })
    }
}

impl FromRef<AppState> for DynRepository {
    fn from_ref(state: &AppState) -> Self {
        state.repo.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<Passkeys> {
    fn from_ref(state: &AppState) -> Self {
        state.passkeys.clone()
    }
}
