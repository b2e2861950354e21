// Port Layer - Interfaces for external dependencies

pub mod directory_watch;
pub mod execution_gateway;
pub mod script_source;
pub mod time_provider;

// Re-exports
pub use directory_watch::{DirectoryWatch, FolderTaskSink};
pub use execution_gateway::{ExecutionGateway, GatewayError};
pub use script_source::{ScriptSource, SQL_EXTENSION};
pub use time_provider::TimeProvider;
