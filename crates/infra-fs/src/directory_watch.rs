// notify-based DirectoryWatch Implementation

use notify::event::CreateKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sqlwatch_core::domain::FolderTask;
use sqlwatch_core::error::{AppError, Result};
use sqlwatch_core::port::{DirectoryWatch, FolderTaskSink};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

fn watch_error(err: notify::Error) -> AppError {
    AppError::Watch(err.to_string())
}

/// Watches one directory (non-recursively) for newly created subfolders
pub struct NotifyDirectoryWatch {
    root: PathBuf,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl NotifyDirectoryWatch {
    /// # Errors
    /// - AppError::Config if `root` does not exist or is not a directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(AppError::Config(format!(
                "Watch path does not exist or is not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root,
            watcher: Mutex::new(None),
        })
    }
}

impl DirectoryWatch for NotifyDirectoryWatch {
    fn subscribe(&self, sink: FolderTaskSink) -> Result<()> {
        let mut guard = self
            .watcher
            .lock()
            .map_err(|_| AppError::InvalidState("watcher lock poisoned".to_string()))?;
        if guard.is_some() {
            warn!(path = %self.root.display(), "Directory is already being watched");
            return Ok(());
        }

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    forward_created_folders(event, &sink);
                }
                Err(e) => error!(error = %e, "Directory watch error"),
            }
        })
        .map_err(watch_error)?;

        watcher
            .watch(&self.root, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;
        *guard = Some(watcher);

        info!(path = %self.root.display(), "Started watching directory");
        Ok(())
    }

    fn unsubscribe(&self) {
        let watcher = match self.watcher.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(mut watcher) = watcher {
            if let Err(e) = watcher.unwatch(&self.root) {
                debug!(error = %e, "Unwatch failed (directory may be gone)");
            }
            info!(path = %self.root.display(), "Stopped filesystem watcher");
        }
    }
}

/// Push one folder task per created directory in `event`
///
/// Backends that cannot classify creations report `CreateKind::Any`; those
/// paths are checked on disk. Returns the number of tasks queued.
pub fn forward_created_folders(event: Event, sink: &FolderTaskSink) -> usize {
    let EventKind::Create(kind) = event.kind else {
        return 0;
    };

    let mut forwarded = 0;
    for path in event.paths {
        let is_folder = match kind {
            CreateKind::Folder => true,
            CreateKind::Any | CreateKind::Other => path.is_dir(),
            CreateKind::File => false,
        };
        if !is_folder {
            continue;
        }

        let task = FolderTask::new(path);
        debug!(task_id = %task.id, folder = %task.path.display(), "Queueing folder task");
        if sink.send(task).is_err() {
            warn!("Folder task queue closed, dropping event");
        } else {
            forwarded += 1;
        }
    }
    forwarded
}
