//! paywire service binary.
//!
//! Loads configuration, connects to PostgreSQL, wires the adapters and serves
//! the callback and notification endpoints until Ctrl-C or SIGTERM.

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paywire::adapters::auth::JwtSessionValidator;
use paywire::adapters::http::{build_app, WebhookAppState};
use paywire::adapters::postgres::PostgresTransactionLedger;
use paywire::adapters::websocket::{NotificationGateway, WebSocketState};
use paywire::application::HandleTransactionWebhookHandler;
use paywire::config::{AppConfig, ConfigError, ServerConfig, ValidationError};
use paywire::domain::billing::SignatureVerifier;

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database unavailable: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.server);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "paywire stopped with an error");
        std::process::exit(1);
    }
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if server.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    config.validate()?;
    info!(environment = ?config.server.environment, "Starting paywire");

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    let gateway = Arc::new(NotificationGateway::new(config.notifications.connection_buffer));
    let handler = HandleTransactionWebhookHandler::new(
        Arc::new(SignatureVerifier::new(config.payment.hmac_secret.clone())),
        Arc::new(PostgresTransactionLedger::new(pool.clone())),
        gateway.clone(),
        config.payment.processing_timeout(),
    );
    let validator = JwtSessionValidator::new(
        &config.auth.jwt_secret,
        config.auth.jwt_issuer.clone(),
        config.auth.leeway_secs,
    );

    let app = build_app(
        WebhookAppState::new(Arc::new(handler)),
        WebSocketState::new(gateway, Arc::new(validator)),
        &config.server,
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Error setting up signal handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Error setting up SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received shutdown signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
