// Script Source Port
// Where SQL script files are discovered and read from

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Extension identifying SQL scripts (matched case-sensitively)
pub const SQL_EXTENSION: &str = "sql";

/// Script source trait
///
/// Implementations:
/// - FsScriptSource: local filesystem (infra-fs)
/// - MockScriptSource: scripted listings (tests)
#[async_trait]
pub trait ScriptSource: Send + Sync {
    /// List every `.sql` file under `folder` (recursively), sorted by path
    ///
    /// An empty list means nothing has been written yet.
    async fn discover(&self, folder: &Path) -> io::Result<Vec<PathBuf>>;

    /// Read the full text of one script
    async fn read_script(&self, path: &Path) -> io::Result<String>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockState {
        // Probes answered with an empty listing before files become visible
        empty_probes: usize,
        discover_calls: usize,
        fail_discover: bool,
        files: Vec<(PathBuf, Option<String>)>,
    }

    /// Mock ScriptSource for testing
    ///
    /// Files are visible after `empty_probes` discovery calls; a file registered
    /// without content fails to read.
    #[derive(Clone, Default)]
    pub struct MockScriptSource {
        state: Arc<Mutex<MockState>>,
    }

    impl MockScriptSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
            self.state
                .lock()
                .unwrap()
                .files
                .push((path.into(), Some(content.into())));
            self
        }

        pub fn with_unreadable_file(self, path: impl Into<PathBuf>) -> Self {
            self.state.lock().unwrap().files.push((path.into(), None));
            self
        }

        /// Answer the first `probes` discovery calls with an empty listing
        pub fn appearing_after(self, probes: usize) -> Self {
            self.state.lock().unwrap().empty_probes = probes;
            self
        }

        pub fn failing_discovery(self) -> Self {
            self.state.lock().unwrap().fail_discover = true;
            self
        }

        pub fn discover_calls(&self) -> usize {
            self.state.lock().unwrap().discover_calls
        }
    }

    #[async_trait]
    impl ScriptSource for MockScriptSource {
        async fn discover(&self, folder: &Path) -> io::Result<Vec<PathBuf>> {
            let mut state = self.state.lock().unwrap();
            state.discover_calls += 1;

            if state.fail_discover {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "mock denied"));
            }
            if state.discover_calls <= state.empty_probes {
                return Ok(Vec::new());
            }

            let mut paths: Vec<PathBuf> = state
                .files
                .iter()
                .map(|(p, _)| p.clone())
                .filter(|p| p.starts_with(folder))
                .collect();
            paths.sort();
            Ok(paths)
        }

        async fn read_script(&self, path: &Path) -> io::Result<String> {
            let state = self.state.lock().unwrap();
            match state.files.iter().find(|(p, _)| p == path).map(|(_, c)| c) {
                Some(Some(text)) => Ok(text.clone()),
                Some(None) => Err(io::Error::new(io::ErrorKind::InvalidData, "mock unreadable")),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "mock missing")),
            }
        }
    }
}
