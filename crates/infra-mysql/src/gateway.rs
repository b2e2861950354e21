// MySQL ExecutionGateway Implementation

use crate::connection::{open_connection, MySqlSettings};
use crate::error::describe_sqlx_error;
use async_trait::async_trait;
use sqlwatch_core::domain::Statement;
use sqlwatch_core::port::{ExecutionGateway, GatewayError};
use sqlx::mysql::MySqlConnection;
use sqlx::{Connection, Executor};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Execution gateway over a single MySQL connection
///
/// The connection sits behind a mutex only for interior mutability; the
/// folder worker is the one caller and drives it serially.
pub struct MySqlGateway {
    settings: MySqlSettings,
    conn: Mutex<Option<MySqlConnection>>,
}

impl MySqlGateway {
    pub fn new(settings: MySqlSettings) -> Self {
        Self {
            settings,
            conn: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ExecutionGateway for MySqlGateway {
    async fn connect(&self) -> Result<(), GatewayError> {
        let conn = open_connection(&self.settings).await?;
        if let Some(old) = self.conn.lock().await.replace(conn) {
            let _ = old.close().await;
        }
        Ok(())
    }

    async fn ensure_connection(&self) -> Result<(), GatewayError> {
        let mut guard = self.conn.lock().await;

        if let Some(conn) = guard.as_mut() {
            match conn.ping().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(error = %describe_sqlx_error(&e), "Database connection lost, reconnecting...");
                }
            }
        } else {
            warn!("No database connection, reconnecting...");
        }

        // Drop the dead connection before dialling again
        *guard = None;
        *guard = Some(open_connection(&self.settings).await?);
        Ok(())
    }

    async fn execute_statements(&self, statements: &[Statement]) -> Result<usize, GatewayError> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| GatewayError::Connection("not connected".to_string()))?;

        // Rolled back on drop if anything below returns early
        let mut tx = conn
            .begin()
            .await
            .map_err(|e| GatewayError::Transaction(describe_sqlx_error(&e)))?;

        for (i, statement) in statements.iter().enumerate() {
            debug!(
                statement_index = i + 1,
                total = statements.len(),
                "Executing statement"
            );

            if let Err(e) = tx.as_mut().execute(sqlx::raw_sql(statement.as_str())).await {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %describe_sqlx_error(&rollback_err), "Rollback failed");
                }
                return Err(GatewayError::Statement {
                    index: i + 1,
                    preview: statement.preview(),
                    message: describe_sqlx_error(&e),
                });
            }
        }

        tx.commit()
            .await
            .map_err(|e| GatewayError::Transaction(describe_sqlx_error(&e)))?;
        Ok(statements.len())
    }

    async fn close(&self) {
        if let Some(conn) = self.conn.lock().await.take() {
            match conn.close().await {
                Ok(()) => info!("Closed database connection"),
                Err(e) => warn!(error = %describe_sqlx_error(&e), "Error closing database connection"),
            }
        }
    }
}
