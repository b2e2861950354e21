// sqlwatch Infrastructure - Filesystem Adapters
// Implements: ScriptSource (walkdir + tokio::fs), DirectoryWatch (notify)

pub mod directory_watch;
pub mod script_source;

pub use directory_watch::NotifyDirectoryWatch;
pub use script_source::FsScriptSource;
