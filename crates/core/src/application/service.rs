// SQL Watch Service - start/stop lifecycle around the folder worker

use crate::application::folder_processor::FolderProcessor;
use crate::application::worker::{shutdown_channel, FolderWorker, ShutdownSender};
use crate::error::{AppError, Result};
use crate::port::{DirectoryWatch, ExecutionGateway};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct RunningWorker {
    shutdown: ShutdownSender,
    handle: JoinHandle<usize>,
}

/// Wires the directory watch, the folder queue and the execution gateway
///
/// `start` and `stop` are both safe to call twice.
pub struct SqlWatchService {
    watch: Arc<dyn DirectoryWatch>,
    gateway: Arc<dyn ExecutionGateway>,
    processor: Arc<FolderProcessor>,
    running: Mutex<Option<RunningWorker>>,
}

impl SqlWatchService {
    pub fn new(
        watch: Arc<dyn DirectoryWatch>,
        gateway: Arc<dyn ExecutionGateway>,
        processor: Arc<FolderProcessor>,
    ) -> Self {
        Self {
            watch,
            gateway,
            processor,
            running: Mutex::new(None),
        }
    }

    /// Connect to the database, subscribe to folder creation and spawn the worker
    ///
    /// # Errors
    /// - AppError::Connection if the initial connection fails
    /// - AppError::Watch if the directory cannot be watched (connection is closed again)
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            warn!("Watcher is already running");
            return Ok(());
        }

        self.gateway
            .connect()
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;

        let (task_tx, task_rx) = mpsc::unbounded_channel();
        if let Err(e) = self.watch.subscribe(task_tx) {
            error!(error = %e, "Failed to subscribe to directory events");
            self.gateway.close().await;
            return Err(e);
        }

        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let worker = FolderWorker::new(Arc::clone(&self.processor));
        let handle = tokio::spawn(async move { worker.run(task_rx, shutdown_rx).await });

        *running = Some(RunningWorker {
            shutdown: shutdown_tx,
            handle,
        });
        info!("Started watching for new folders");
        Ok(())
    }

    /// Stop accepting folders, wait for the worker, then close the connection
    ///
    /// A folder already being processed runs to completion first.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(worker) = running.take() else {
            debug!("Watcher is not running");
            return;
        };

        info!("Stopping SQL watcher...");
        self.watch.unsubscribe();
        worker.shutdown.shutdown();

        match worker.handle.await {
            Ok(processed) => info!(folders_processed = processed, "Stopped folder worker"),
            Err(e) => error!(error = %e, "Folder worker terminated abnormally"),
        }

        self.gateway.close().await;
        info!("SQL watcher stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}
