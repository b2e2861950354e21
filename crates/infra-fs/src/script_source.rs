// Filesystem ScriptSource Implementation

use async_trait::async_trait;
use sqlwatch_core::port::{ScriptSource, SQL_EXTENSION};
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Reads scripts from the local filesystem
#[derive(Debug, Default, Clone)]
pub struct FsScriptSource;

impl FsScriptSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptSource for FsScriptSource {
    async fn discover(&self, folder: &Path) -> io::Result<Vec<PathBuf>> {
        let folder = folder.to_path_buf();
        tokio::task::spawn_blocking(move || find_sql_files(&folder))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }

    async fn read_script(&self, path: &Path) -> io::Result<String> {
        let text = tokio::fs::read_to_string(path).await?;
        // Editors on Windows like to prepend a BOM
        Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }
}

/// Exact, case-sensitive `.sql` extension check
pub fn is_sql_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(SQL_EXTENSION))
}

/// Every `.sql` file under `folder`, recursively, sorted by path
///
/// Fails if `folder` itself cannot be read; unreadable entries below it are
/// skipped with a warning.
pub fn find_sql_files(folder: &Path) -> io::Result<Vec<PathBuf>> {
    let mut scripts = Vec::new();

    for entry in WalkDir::new(folder).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        // path().is_file() follows symlinks to regular files
        if is_sql_file(entry.path()) && entry.path().is_file() {
            scripts.push(entry.into_path());
        }
    }

    scripts.sort();
    Ok(scripts)
}
