//! VidHive HTTP API server.
//!
//! Wires the session lifecycle manager, the Postgres-backed user store,
//! and the asset host client into the axum router.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use ctrlc::set_handler;
use pico_args::Arguments;
use tracing::info;
use vidhive::{
    auth::{AuthManager, TokenConfig, TokenIssuer},
    channel::ChannelManager,
    db::{Database, PgUserRepository},
    media::HttpAssetStore,
};

use vh_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run the VidHive backend API server

USAGE:
  vh_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8790]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  ACCESS_TOKEN_SECRET      Access token signing secret
  REFRESH_TOKEN_SECRET     Refresh token signing secret (must differ)
  PASSWORD_PEPPER          Password hashing pepper
  ASSET_HOST_URL           External asset host base URL
  ASSET_HOST_API_KEY       External asset host credential
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.value_from_str("--bind").ok();
    let database_url_override: Option<String> = pargs.value_from_str("--db-url").ok();

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();

    let config = ServerConfig::from_env(bind_override, database_url_override)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    info!("Starting VidHive server at {}", config.bind);

    // Initialize database
    info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    info!("Database connected successfully");

    // Signing secrets are loaded once here and immutable afterwards.
    let issuer = TokenIssuer::new(
        TokenConfig::new(
            config.security.access_token_secret.clone(),
            config.security.refresh_token_secret.clone(),
        )
        .with_ttls(
            chrono::Duration::minutes(config.security.access_ttl_minutes),
            chrono::Duration::days(config.security.refresh_ttl_days),
        ),
    )
    .map_err(|e| anyhow::anyhow!("Token configuration error: {}", e))?;

    // Create managers
    let pool = Arc::new(db.pool().clone());
    let store = Arc::new(PgUserRepository::new(db.pool().clone()));
    let assets = Arc::new(HttpAssetStore::new(
        config.media.base_url.clone(),
        config.media.api_key.clone(),
    ));

    let auth_manager = Arc::new(
        AuthManager::new(
            store,
            assets,
            issuer,
            config.security.password_pepper.clone(),
        )
        .with_session_rotation(config.security.rotate_sessions_on_password_change),
    );
    let channel_manager = Arc::new(ChannelManager::new(pool));

    // Optional Prometheus exporter
    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind)
            .map_err(|e| anyhow::anyhow!("Metrics exporter error: {}", e))?;
        info!("Metrics exporter listening on {}", metrics_bind);
    }

    // Create API state
    let api_state = api::AppState {
        auth_manager,
        channel_manager,
        token_delivery: config.token_delivery,
        access_ttl_secs: config.security.access_ttl_minutes * 60,
        refresh_ttl_secs: config.security.refresh_ttl_days * 24 * 60 * 60,
    };

    // Create router
    let app = api::create_router(api_state);

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
