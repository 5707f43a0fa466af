//! Golden Recipe Quality Engine (goldrec-qe) - Main entry point
//!
//! Loads configuration, opens the collaborators (SQLite or in-memory), seeds
//! the identity provider and serves the HTTP API until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use goldrec_common::config::{resolve_config_path, RootFolderInitializer};
use goldrec_common::EventBus;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goldrec_qe::config::{CliArgs, ServiceConfig, MODULE_NAME};
use goldrec_qe::db::{self, Stores};
use goldrec_qe::services::QualityEngine;
use goldrec_qe::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();
    let config = ServiceConfig::load(&cli);

    // RUST_LOG wins over the configured level
    let fallback_filter = format!(
        "goldrec_qe={level},goldrec_common={level},tower_http={level}",
        level = config.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting {} v{} on {}:{}",
        MODULE_NAME,
        env!("CARGO_PKG_VERSION"),
        config.bind_address,
        config.port
    );
    if let Some(path) = resolve_config_path(cli.config.as_deref(), MODULE_NAME) {
        info!("Config file: {}", path.display());
    }

    let stores = if config.in_memory {
        info!("Running with in-memory stores; state is lost on exit");
        Stores::in_memory()
    } else {
        let initializer = RootFolderInitializer::new(config.root_folder.clone());
        initializer
            .ensure_directory_exists()
            .context("Failed to create root folder")?;
        let db_path = initializer.database_path();
        info!("Database: {}", db_path.display());
        let pool = db::init_database_pool(&db_path)
            .await
            .context("Failed to open database")?;
        Stores::sqlite(pool)
    };

    for user in &config.users {
        stores
            .users
            .upsert_user(user)
            .await
            .with_context(|| format!("Failed to seed user {}", user.id))?;
    }
    if !config.users.is_empty() {
        info!("Seeded {} user(s) into the identity provider", config.users.len());
    }

    let event_bus = EventBus::new(config.event_capacity);
    let engine = Arc::new(QualityEngine::new(stores, event_bus));
    let app = build_router(AppState::new(engine));

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
