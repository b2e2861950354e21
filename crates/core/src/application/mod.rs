// Application Layer - Use Cases

pub mod folder_processor;
pub mod service;
pub mod worker;

// Re-exports
pub use folder_processor::{DiscoveryPolicy, FolderProcessor};
pub use service::SqlWatchService;
pub use worker::{shutdown_channel, FolderWorker, ShutdownSender, ShutdownToken};
