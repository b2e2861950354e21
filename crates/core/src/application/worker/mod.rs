// Folder Worker - single consumer of the folder task queue

pub mod constants;
mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::folder_processor::FolderProcessor;
use crate::domain::FolderTask;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

/// Drains folder tasks one at a time
///
/// Serial by construction: the next task is only received once the current
/// folder is fully processed. Shutdown is honoured between folders, never in
/// the middle of one.
pub struct FolderWorker {
    processor: Arc<FolderProcessor>,
}

impl FolderWorker {
    pub fn new(processor: Arc<FolderProcessor>) -> Self {
        Self { processor }
    }

    /// Run until shutdown is requested or the queue closes
    ///
    /// Returns the number of folders processed.
    pub async fn run(
        &self,
        mut tasks: UnboundedReceiver<FolderTask>,
        mut shutdown: ShutdownToken,
    ) -> usize {
        info!("Folder worker started");
        let mut processed = 0;

        loop {
            if shutdown.is_shutdown() {
                info!("Folder worker shutting down");
                report_dropped(&tasks);
                break;
            }

            let task = tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("Folder worker interrupted while idle");
                    report_dropped(&tasks);
                    break;
                }
                task = tasks.recv() => match task {
                    Some(task) => task,
                    None => {
                        info!("Folder task queue closed");
                        break;
                    }
                },
            };

            info!(
                task_id = %task.id,
                folder = %task.path.display(),
                "New folder detected"
            );
            self.processor.process_folder(&task).await;
            processed += 1;
        }

        info!(folders_processed = processed, "Folder worker stopped");
        processed
    }
}

/// Log folders still queued when the worker stops; they are never processed
fn report_dropped(tasks: &UnboundedReceiver<FolderTask>) -> usize {
    let pending = tasks.len();
    if pending > 0 {
        warn!(pending, "Dropping queued folders on shutdown");
    }
    pending
}
