// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Submissions at or above this percentage count as passed in analytics.
pub const PASS_PERCENTAGE: u32 = 70;

/// Minimum cosine similarity for a face descriptor login.
pub const FACE_MATCH_THRESHOLD: f64 = 0.98;

/// Face descriptors shorter than this are rejected.
pub const MIN_FACE_DESCRIPTOR_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL URL. When absent the in-memory store is used.
    pub database_url: Option<String>,
    /// Forces the in-memory store even when `database_url` is set.
    pub use_in_memory: bool,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub frontend_origin: String,
    pub log_dir: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub seed_demo_exams: bool,
    /// Relying party id for passkeys, the bare domain of the frontend.
    pub webauthn_rp_id: String,
    /// Origin the browser reports during passkey ceremonies.
    pub webauthn_origin: String,
}

/// Which repository implementation the process runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres(String),
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let use_in_memory = env_flag("USE_IN_MEMORY") || env_flag("DISABLE_DB");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        let frontend_origin = env::var("FRONTEND_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let seed_demo_exams = env::var("SEED_DEMO_EXAMS")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let webauthn_rp_id = env::var("WEBAUTHN_RP_ID").unwrap_or_else(|_| "localhost".to_string());

        let webauthn_origin = env::var("WEBAUTHN_ORIGIN").unwrap_or_else(|_| frontend_origin.clone());

        Self {
            database_url,
            use_in_memory,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            frontend_origin,
            log_dir,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            seed_demo_exams,
            webauthn_rp_id,
            webauthn_origin,
        }
    }

    pub fn storage_backend(&self) -> StorageBackend {
        match &self.database_url {
            Some(url) if !self.use_in_memory => StorageBackend::Postgres(url.clone()),
            _ => StorageBackend::Memory,
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| v == "true").unwrap_or(false)
}
