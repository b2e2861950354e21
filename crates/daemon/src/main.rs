//! sqlwatch - Main Entry Point
//! Watches a directory and runs every new folder's SQL files against MySQL

mod config;
mod logging;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::DaemonConfig;
use sqlwatch_core::application::{FolderProcessor, SqlWatchService};
use sqlwatch_core::port::time_provider::SystemTimeProvider;
use sqlwatch_infra_fs::{FsScriptSource, NotifyDirectoryWatch};
use sqlwatch_infra_mysql::MySqlGateway;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (guard flushes the optional log file on exit)
    let _log_guard = logging::init_logging()?;

    info!("sqlwatch v{} starting...", VERSION);

    // 2. Load configuration (.env first; the process environment wins)
    crate::config::load_dotenv(None);
    let config = DaemonConfig::from_env().context("Invalid configuration")?;
    info!(
        watch_path = %config.watch_path.display(),
        database = %config.db.target(),
        poll_interval_secs = config.discovery.poll_interval().as_secs(),
        max_wait_secs = config.discovery.max_wait().as_secs(),
        "Configuration loaded"
    );

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let source = Arc::new(FsScriptSource::new());
    let gateway = Arc::new(MySqlGateway::new(config.db.clone()));
    let processor = Arc::new(FolderProcessor::new(
        source,
        gateway.clone(),
        time_provider,
        config.discovery,
    ));
    let watch = Arc::new(NotifyDirectoryWatch::new(&config.watch_path)?);
    let service = SqlWatchService::new(watch, gateway, processor);

    // 4. Connect and start watching
    service
        .start()
        .await
        .context("Failed to start watcher")?;

    info!("System ready. Waiting for new folders...");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    wait_for_shutdown_signal().await?;

    // 6. Graceful shutdown (the folder in progress finishes first)
    service.stop().await;

    info!("Shutdown complete.");
    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}
