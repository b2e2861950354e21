// Folder Processor - discovers SQL files in a new folder and executes them
use crate::application::worker::constants::{
    DISCOVERY_MAX_WAIT, DISCOVERY_POLL_INTERVAL, MIN_POLL_INTERVAL,
};
use crate::domain::{
    split_statements, FileOutcome, FileReport, FolderOutcome, FolderReport, FolderTask,
};
use crate::error::Result;
use crate::port::{ExecutionGateway, GatewayError, ScriptSource, TimeProvider};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// How long to wait for scripts to appear in a freshly created folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryPolicy {
    poll_interval: Duration,
    max_wait: Duration,
}

impl DiscoveryPolicy {
    /// Create a policy; the poll interval is clamped to at least 1ms
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            max_wait,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self::new(DISCOVERY_POLL_INTERVAL, DISCOVERY_MAX_WAIT)
    }
}

/// Folder processor
///
/// For one folder task: waits for `.sql` files, then runs each file (sorted by
/// path) through the splitter and the execution gateway, one transaction per
/// file. A failing file is logged and the next one is still attempted.
pub struct FolderProcessor {
    source: Arc<dyn ScriptSource>,
    gateway: Arc<dyn ExecutionGateway>,
    time_provider: Arc<dyn TimeProvider>,
    policy: DiscoveryPolicy,
}

impl FolderProcessor {
    /// Create a new folder processor
    ///
    /// # Arguments
    /// * `source` - Where scripts are discovered and read
    /// * `gateway` - Transactional executor for statement batches
    /// * `time_provider` - Clock used for per-file durations
    /// * `policy` - Discovery wait window
    pub fn new(
        source: Arc<dyn ScriptSource>,
        gateway: Arc<dyn ExecutionGateway>,
        time_provider: Arc<dyn TimeProvider>,
        policy: DiscoveryPolicy,
    ) -> Self {
        Self {
            source,
            gateway,
            time_provider,
            policy,
        }
    }

    /// Process every SQL file of a folder task
    ///
    /// Never fails: discovery errors, timeouts and per-file failures are logged
    /// and reflected in the returned report.
    pub async fn process_folder(&self, task: &FolderTask) -> FolderReport {
        let span = info_span!(
            "folder_task",
            task_id = %task.id,
            folder = %task.path.display()
        );
        let outcome = self.run_folder(task.path()).instrument(span).await;

        FolderReport {
            task_id: task.id.clone(),
            folder: task.path.clone(),
            outcome,
        }
    }

    async fn run_folder(&self, folder: &Path) -> FolderOutcome {
        info!("Processing folder");

        let scripts = match self.wait_for_scripts(folder).await {
            Ok(scripts) => scripts,
            Err(e) => {
                error!(error = %e, "Error listing folder");
                return FolderOutcome::DiscoveryFailed(e.to_string());
            }
        };

        if scripts.is_empty() {
            warn!(
                max_wait_secs = self.policy.max_wait.as_secs(),
                "No SQL files found in folder within the wait window"
            );
            return FolderOutcome::NoScripts;
        }

        info!(files = scripts.len(), "Found SQL files");

        let mut reports = Vec::with_capacity(scripts.len());
        for path in scripts {
            let outcome = self.execute_script(&path).await;
            reports.push(FileReport { path, outcome });
        }

        let committed = reports.iter().filter(|r| r.outcome.is_committed()).count();
        info!(
            committed,
            failed = reports.len() - committed,
            "Completed processing folder"
        );

        FolderOutcome::Processed(reports)
    }

    /// Probe for scripts until some appear or the wait window is used up
    ///
    /// Probes at 0, interval, 2*interval, ... and a final probe at exactly
    /// `max_wait`; the last sleep is shortened so the window is never overrun.
    async fn wait_for_scripts(&self, folder: &Path) -> io::Result<Vec<PathBuf>> {
        let mut elapsed = Duration::ZERO;

        loop {
            let scripts = self.source.discover(folder).await?;
            if !scripts.is_empty() || elapsed >= self.policy.max_wait {
                return Ok(scripts);
            }

            info!(
                elapsed_secs = elapsed.as_secs(),
                "Waiting for SQL files to appear"
            );
            let step = self.policy.poll_interval.min(self.policy.max_wait - elapsed);
            sleep(step).await;
            elapsed += step;
        }
    }

    async fn execute_script(&self, path: &Path) -> FileOutcome {
        let started = self.time_provider.now_millis();

        match self.run_script(path).await {
            Ok(statements) => {
                let duration_ms = self.time_provider.now_millis() - started;
                info!(
                    file = %path.display(),
                    statements,
                    duration_ms,
                    "Executed SQL file"
                );
                FileOutcome::Committed {
                    statements,
                    duration_ms,
                }
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "Failed to execute SQL file");
                FileOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn run_script(&self, path: &Path) -> Result<usize> {
        self.gateway.ensure_connection().await?;

        info!(file = %path.display(), "Executing SQL file");
        let script = self.source.read_script(path).await?;
        let statements = split_statements(&script);

        if statements.is_empty() {
            warn!(file = %path.display(), "SQL file contains no statements");
            return Ok(0);
        }
        debug!(statements = statements.len(), "Split SQL file");

        let executed = self
            .gateway
            .execute_statements(&statements)
            .await
            .inspect_err(|e| {
                if let GatewayError::Statement {
                    index,
                    preview,
                    message,
                } = e
                {
                    error!(
                        file = %path.display(),
                        statement_index = *index,
                        total = statements.len(),
                        statement = %preview,
                        error = %message,
                        "Error executing statement, transaction rolled back"
                    );
                }
            })?;

        Ok(executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::execution_gateway::mocks::MockExecutionGateway;
    use crate::port::script_source::mocks::MockScriptSource;
    use crate::port::time_provider::mocks::SteppingTimeProvider;
    use crate::port::time_provider::SystemTimeProvider;
    use tokio::time::Instant;

    fn processor(source: MockScriptSource, gateway: MockExecutionGateway) -> FolderProcessor {
        FolderProcessor::new(
            Arc::new(source),
            Arc::new(gateway),
            Arc::new(SystemTimeProvider),
            DiscoveryPolicy::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_processes_files_in_sorted_order() {
        let source = MockScriptSource::new()
            .with_file("/watch/run/002_seed.sql", "INSERT INTO t VALUES (1);")
            .with_file("/watch/run/001_init.sql", "CREATE TABLE t (id INT);");
        let gateway = MockExecutionGateway::new();
        let processor = processor(source, gateway.clone());

        let report = processor
            .process_folder(&FolderTask::new("/watch/run"))
            .await;

        assert_eq!(report.committed_count(), 2);
        let files: Vec<_> = report.files().iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/watch/run/001_init.sql"),
                PathBuf::from("/watch/run/002_seed.sql"),
            ]
        );
        assert_eq!(
            gateway.committed(),
            vec![
                vec!["CREATE TABLE t (id INT)".to_string()],
                vec!["INSERT INTO t VALUES (1)".to_string()],
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_file_does_not_stop_folder() {
        let source = MockScriptSource::new()
            .with_file(
                "/watch/run/001_init.sql",
                "CREATE TABLE t (id INT);\nBROKEN STATEMENT;\nSELECT 1;",
            )
            .with_file("/watch/run/002_seed.sql", "INSERT INTO t VALUES (1);");
        let gateway = MockExecutionGateway::new_failing_on("BROKEN");
        let processor = processor(source, gateway.clone());

        let report = processor
            .process_folder(&FolderTask::new("/watch/run"))
            .await;

        let files = report.files();
        assert_eq!(files.len(), 2);
        match &files[0].outcome {
            FileOutcome::Failed { reason } => assert!(reason.contains("Statement 2")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(files[1].outcome.is_committed());

        // Rolled back batch stopped at the failing statement
        assert_eq!(
            gateway.rolled_back(),
            vec![vec![
                "CREATE TABLE t (id INT)".to_string(),
                "BROKEN STATEMENT".to_string(),
            ]]
        );
        assert_eq!(gateway.committed().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_late_files() {
        // Five empty probes = files appear 10s after the folder
        let source = MockScriptSource::new()
            .with_file("/watch/late/001.sql", "SELECT 1;")
            .appearing_after(5);
        let gateway = MockExecutionGateway::new();
        let processor = processor(source.clone(), gateway.clone());

        let started = Instant::now();
        let report = processor
            .process_folder(&FolderTask::new("/watch/late"))
            .await;

        assert_eq!(report.committed_count(), 1);
        assert_eq!(source.discover_calls(), 6);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(10) && waited < Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_wait() {
        let source = MockScriptSource::new().appearing_after(usize::MAX);
        let gateway = MockExecutionGateway::new();
        let processor = processor(source.clone(), gateway.clone());

        let started = Instant::now();
        let report = processor
            .process_folder(&FolderTask::new("/watch/empty"))
            .await;

        assert_eq!(report.outcome, FolderOutcome::NoScripts);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(30) && waited < Duration::from_secs(32));
        // Probes at 0, 2, ..., 30
        assert_eq!(source.discover_calls(), 16);
        assert_eq!(gateway.ensure_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uneven_interval_stops_at_max_wait() {
        let source = MockScriptSource::new().appearing_after(usize::MAX);
        let processor = FolderProcessor::new(
            Arc::new(source.clone()),
            Arc::new(MockExecutionGateway::new()),
            Arc::new(SystemTimeProvider),
            DiscoveryPolicy::new(Duration::from_secs(2), Duration::from_secs(3)),
        );

        let started = Instant::now();
        let report = processor
            .process_folder(&FolderTask::new("/watch/empty"))
            .await;

        assert_eq!(report.outcome, FolderOutcome::NoScripts);
        // Probes at 0, 2 and 3; never at 4
        assert_eq!(source.discover_calls(), 3);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(3) && waited < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discovery_error_ends_task() {
        let source = MockScriptSource::new().failing_discovery();
        let gateway = MockExecutionGateway::new();
        let processor = processor(source.clone(), gateway);

        let report = processor
            .process_folder(&FolderTask::new("/watch/denied"))
            .await;

        assert!(matches!(report.outcome, FolderOutcome::DiscoveryFailed(_)));
        assert_eq!(source.discover_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_file_is_skipped() {
        let source = MockScriptSource::new()
            .with_unreadable_file("/watch/run/001.sql")
            .with_file("/watch/run/002.sql", "SELECT 2;");
        let gateway = MockExecutionGateway::new();
        let processor = processor(source, gateway.clone());

        let report = processor
            .process_folder(&FolderTask::new("/watch/run"))
            .await;

        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.committed_count(), 1);
        assert_eq!(gateway.committed(), vec![vec!["SELECT 2".to_string()]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_failure_fails_each_file() {
        let source = MockScriptSource::new()
            .with_file("/watch/run/001.sql", "SELECT 1;")
            .with_file("/watch/run/002.sql", "SELECT 2;");
        let gateway = MockExecutionGateway::new();
        gateway.set_fail_ensure(true);
        let processor = processor(source, gateway.clone());

        let report = processor
            .process_folder(&FolderTask::new("/watch/run"))
            .await;

        assert_eq!(report.failed_count(), 2);
        assert_eq!(gateway.ensure_calls(), 2);
        assert!(gateway.committed().is_empty());
        assert!(gateway.rolled_back().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_comment_only_file_sends_nothing() {
        let source = MockScriptSource::new()
            .with_file("/watch/run/001.sql", "-- generated header\n/* nothing here; */\n");
        let gateway = MockExecutionGateway::new();
        let processor = processor(source, gateway.clone());

        let report = processor
            .process_folder(&FolderTask::new("/watch/run"))
            .await;

        assert!(matches!(
            report.files()[0].outcome,
            FileOutcome::Committed { statements: 0, .. }
        ));
        assert!(gateway.committed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_measured_with_time_provider() {
        let source = MockScriptSource::new().with_file("/watch/run/001.sql", "SELECT 1;");
        let processor = FolderProcessor::new(
            Arc::new(source),
            Arc::new(MockExecutionGateway::new()),
            Arc::new(SteppingTimeProvider::new(1_000, 7)),
            DiscoveryPolicy::default(),
        );

        let report = processor
            .process_folder(&FolderTask::new("/watch/run"))
            .await;

        assert_eq!(
            report.files()[0].outcome,
            FileOutcome::Committed {
                statements: 1,
                duration_ms: 7
            }
        );
    }

    #[test]
    fn test_policy_clamps_zero_interval() {
        let policy = DiscoveryPolicy::new(Duration::ZERO, Duration::from_secs(1));
        assert_eq!(policy.poll_interval(), MIN_POLL_INTERVAL);
        assert_eq!(policy.max_wait(), Duration::from_secs(1));
    }
}
