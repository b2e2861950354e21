// Execution Gateway Port
// Transactional boundary between statement sequences and the database

use crate::domain::Statement;
use async_trait::async_trait;
use thiserror::Error;

/// Gateway errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A statement failed; the batch was rolled back and the rest skipped
    #[error("Statement {index} failed: {message} (statement: {preview})")]
    Statement {
        /// 1-based position within the batch
        index: usize,
        preview: String,
        message: String,
    },

    #[error("Transaction error: {0}")]
    Transaction(String),
}

/// Execution Gateway trait
///
/// Owns a single database connection. Callers drive it serially.
///
/// Implementations:
/// - MySqlGateway: sqlx MySQL connection (infra-mysql)
/// - MockExecutionGateway: records batches (tests)
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Open the connection
    ///
    /// # Errors
    /// - GatewayError::Connection if the server cannot be reached in time
    async fn connect(&self) -> Result<(), GatewayError>;

    /// Verify liveness, reconnecting if the connection is missing or dead
    ///
    /// # Errors
    /// - GatewayError::Connection if reconnecting fails
    async fn ensure_connection(&self) -> Result<(), GatewayError>;

    /// Execute `statements` in order as one transaction
    ///
    /// Commits once after the last statement. On the first failing statement the
    /// transaction is rolled back and the remaining statements are not sent.
    ///
    /// Returns the number of statements executed.
    async fn execute_statements(&self, statements: &[Statement]) -> Result<usize, GatewayError>;

    /// Close the connection if open (safe to call repeatedly)
    async fn close(&self);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct MockState {
        connected: bool,
        connect_calls: usize,
        ensure_calls: usize,
        close_calls: usize,
        fail_connect: bool,
        fail_ensure: bool,
        fail_pattern: Option<String>,
        committed: Vec<Vec<String>>,
        rolled_back: Vec<Vec<String>>,
    }

    /// Mock Execution Gateway for testing
    ///
    /// Records every batch as committed or rolled back. A batch rolls back when
    /// one of its statements contains the configured failure pattern.
    #[derive(Clone, Default)]
    pub struct MockExecutionGateway {
        state: Arc<Mutex<MockState>>,
    }

    impl MockExecutionGateway {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail any statement containing `pattern`
        pub fn new_failing_on(pattern: impl Into<String>) -> Self {
            let gateway = Self::new();
            gateway.state.lock().unwrap().fail_pattern = Some(pattern.into());
            gateway
        }

        pub fn set_fail_connect(&self, fail: bool) {
            self.state.lock().unwrap().fail_connect = fail;
        }

        pub fn set_fail_ensure(&self, fail: bool) {
            self.state.lock().unwrap().fail_ensure = fail;
        }

        pub fn is_connected(&self) -> bool {
            self.state.lock().unwrap().connected
        }

        pub fn connect_calls(&self) -> usize {
            self.state.lock().unwrap().connect_calls
        }

        pub fn ensure_calls(&self) -> usize {
            self.state.lock().unwrap().ensure_calls
        }

        pub fn close_calls(&self) -> usize {
            self.state.lock().unwrap().close_calls
        }

        pub fn committed(&self) -> Vec<Vec<String>> {
            self.state.lock().unwrap().committed.clone()
        }

        pub fn rolled_back(&self) -> Vec<Vec<String>> {
            self.state.lock().unwrap().rolled_back.clone()
        }
    }

    #[async_trait]
    impl ExecutionGateway for MockExecutionGateway {
        async fn connect(&self) -> Result<(), GatewayError> {
            let mut state = self.state.lock().unwrap();
            state.connect_calls += 1;
            if state.fail_connect {
                return Err(GatewayError::Connection("mock connect failure".to_string()));
            }
            state.connected = true;
            Ok(())
        }

        async fn ensure_connection(&self) -> Result<(), GatewayError> {
            let mut state = self.state.lock().unwrap();
            state.ensure_calls += 1;
            if state.fail_ensure {
                return Err(GatewayError::Connection("mock reconnect failure".to_string()));
            }
            state.connected = true;
            Ok(())
        }

        async fn execute_statements(
            &self,
            statements: &[Statement],
        ) -> Result<usize, GatewayError> {
            let mut state = self.state.lock().unwrap();
            let mut sent = Vec::new();

            for (i, statement) in statements.iter().enumerate() {
                sent.push(statement.as_str().to_string());
                let failed = state
                    .fail_pattern
                    .as_deref()
                    .is_some_and(|p| statement.as_str().contains(p));
                if failed {
                    state.rolled_back.push(sent);
                    return Err(GatewayError::Statement {
                        index: i + 1,
                        preview: statement.preview(),
                        message: "mock statement failure".to_string(),
                    });
                }
            }

            let count = sent.len();
            state.committed.push(sent);
            Ok(count)
        }

        async fn close(&self) {
            let mut state = self.state.lock().unwrap();
            state.close_calls += 1;
            state.connected = false;
        }
    }
}
