// Domain Layer - Pure logic and entities

pub mod folder;
pub mod splitter;
pub mod statement;

// Re-exports
pub use folder::{FileOutcome, FileReport, FolderOutcome, FolderReport, FolderTask, FolderTaskId};
pub use splitter::split_statements;
pub use statement::{Statement, STATEMENT_PREVIEW_CHARS};
