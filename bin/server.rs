// Student Admin - Web Server
// REST API with Axum over the SQLite store

use anyhow::{Context, Result};
use clap::Parser;
use student_admin::api::{self, AppState};
use student_admin::{init_tracing, open_database, seed_if_empty, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    let _log_guards = init_tracing("info,tower_http=info", config.log_dir.as_deref())
        .context("Failed to initialise logging")?;

    // Open database
    let mut conn = open_database(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;
    info!(path = %config.database.display(), "Database opened");

    if config.seeding_enabled() {
        seed_if_empty(
            &mut conn,
            config.seed_courses.as_deref(),
            config.seed_students.as_deref(),
        )
        .context("Test data import failed")?;
    }

    // Create shared state
    let state = AppState::new(
        conn,
        &config.environment,
        &config.database.display().to_string(),
    );
    let app = api::app(state, config.static_dir.as_deref());

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(address = %addr, environment = %config.environment, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                // Fall back to Ctrl+C only
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
