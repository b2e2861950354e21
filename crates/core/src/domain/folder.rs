// Folder Domain Model

use std::path::{Path, PathBuf};

/// Folder task ID (UUID v4)
pub type FolderTaskId = String;

/// One directory-creation event waiting to be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderTask {
    pub id: FolderTaskId,
    pub path: PathBuf,
}

impl FolderTask {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), path)
    }

    pub fn with_id(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Result of executing one script file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Transaction committed (zero statements means nothing was sent)
    Committed { statements: usize, duration_ms: i64 },
    /// Script skipped or rolled back; the folder moved on
    Failed { reason: String },
}

impl FileOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, FileOutcome::Committed { .. })
    }
}

impl std::fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOutcome::Committed { statements, .. } => {
                write!(f, "COMMITTED ({} statements)", statements)
            }
            FileOutcome::Failed { reason } => write!(f, "FAILED ({})", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// How a folder task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    /// Every discovered file was attempted (see per-file outcomes)
    Processed(Vec<FileReport>),
    /// No `.sql` file showed up within the discovery window
    NoScripts,
    /// Listing the folder failed
    DiscoveryFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderReport {
    pub task_id: FolderTaskId,
    pub folder: PathBuf,
    pub outcome: FolderOutcome,
}

impl FolderReport {
    /// Per-file reports, empty unless the folder was processed
    pub fn files(&self) -> &[FileReport] {
        match &self.outcome {
            FolderOutcome::Processed(files) => files,
            _ => &[],
        }
    }

    pub fn committed_count(&self) -> usize {
        self.files()
            .iter()
            .filter(|f| f.outcome.is_committed())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.files().len() - self.committed_count()
    }
}
