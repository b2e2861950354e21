// sqlwatch Infrastructure - MySQL Adapter
// Implements: ExecutionGateway over a single sqlx connection

mod connection;
mod error;
mod gateway;

pub use connection::{open_connection, MySqlSettings, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
pub use error::describe_sqlx_error;
pub use gateway::MySqlGateway;

// Note: sqlx::Error cannot convert into core errors here (orphan rules);
// describe_sqlx_error renders it into GatewayError messages instead
