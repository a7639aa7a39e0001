// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use exam_portal::config::{Config, StorageBackend};
use exam_portal::routes;
use exam_portal::state::AppState;
use exam_portal::store::{DynRepository, MemoryRepository, PgRepository, seed};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let repo = match connect_repository(&config).await {
        Ok(repo) => repo,
        Err(e) => {
            tracing::error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    // Seed admin user and demo exams
    let admin_id = match seed::seed_admin(repo.as_ref(), &config).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to seed admin user: {:?}", e);
            None
        }
    };
    if config.seed_demo_exams {
        if let Err(e) = seed::seed_demo_exams(repo.as_ref(), admin_id.unwrap_or(1)).await {
            tracing::error!("Failed to seed demo exams: {:?}", e);
        }
    }

    let state = match AppState::new(repo, config.clone()) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to set up passkeys: {}", e);
            std::process::exit(1);
        }
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", addr);

    // Start the server
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}

/// Builds the repository selected by the configuration.
///
/// PostgreSQL is retried a few times so the service can start alongside its database;
/// migrations run automatically once connected.
async fn connect_repository(config: &Config) -> Result<DynRepository, Box<dyn std::error::Error>> {
    let database_url = match config.storage_backend() {
        StorageBackend::Memory => {
            tracing::warn!("Starting server with in-memory storage only (DB disabled or no URL).");
            return Ok(Arc::new(MemoryRepository::new()));
        }
        StorageBackend::Postgres(url) => url,
    };

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    return Err(format!("Failed to connect to database after 5 retries: {}", e).into());
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    Ok(Arc::new(PgRepository::new(pool)))
}
