// Directory Watch Port
// Turns "subfolder created" notifications into folder tasks on a channel

use crate::domain::FolderTask;
use crate::error::Result;
use tokio::sync::mpsc::UnboundedSender;

/// Sending half of the folder task queue
pub type FolderTaskSink = UnboundedSender<FolderTask>;

/// Directory watch trait
///
/// Watches exactly one root directory, non-recursively. Each newly created
/// child directory becomes one [`FolderTask`] pushed onto the sink.
///
/// Implementations:
/// - NotifyDirectoryWatch: OS notifications via `notify` (infra-fs)
/// - MockDirectoryWatch: hands the sink to the test (tests)
pub trait DirectoryWatch: Send + Sync {
    /// Start delivering folder tasks to `sink`
    ///
    /// Subscribing while already subscribed is a no-op.
    fn subscribe(&self, sink: FolderTaskSink) -> Result<()>;

    /// Stop watching and drop the sink (closes the queue)
    ///
    /// Safe to call when not subscribed.
    fn unsubscribe(&self);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockState {
        sink: Option<FolderTaskSink>,
        subscribe_calls: usize,
        unsubscribe_calls: usize,
        fail_subscribe: bool,
    }

    /// Mock DirectoryWatch for testing
    ///
    /// `emit` plays the role of the OS notification.
    #[derive(Clone, Default)]
    pub struct MockDirectoryWatch {
        state: Arc<Mutex<MockState>>,
    }

    impl MockDirectoryWatch {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn new_failing() -> Self {
            let watch = Self::new();
            watch.state.lock().unwrap().fail_subscribe = true;
            watch
        }

        /// Simulate creation of `path`; returns false if nobody is subscribed
        pub fn emit(&self, path: impl Into<PathBuf>) -> bool {
            let state = self.state.lock().unwrap();
            match &state.sink {
                Some(sink) => sink.send(FolderTask::new(path)).is_ok(),
                None => false,
            }
        }

        pub fn is_subscribed(&self) -> bool {
            self.state.lock().unwrap().sink.is_some()
        }

        pub fn subscribe_calls(&self) -> usize {
            self.state.lock().unwrap().subscribe_calls
        }

        pub fn unsubscribe_calls(&self) -> usize {
            self.state.lock().unwrap().unsubscribe_calls
        }
    }

    impl DirectoryWatch for MockDirectoryWatch {
        fn subscribe(&self, sink: FolderTaskSink) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.subscribe_calls += 1;
            if state.fail_subscribe {
                return Err(AppError::Watch("mock subscribe failure".to_string()));
            }
            if state.sink.is_none() {
                state.sink = Some(sink);
            }
            Ok(())
        }

        fn unsubscribe(&self) {
            let mut state = self.state.lock().unwrap();
            state.unsubscribe_calls += 1;
            state.sink = None;
        }
    }
}
