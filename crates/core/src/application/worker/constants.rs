// Folder processing constants (no magic values)
use std::time::Duration;

/// Interval between discovery probes of a new folder (2s)
pub const DISCOVERY_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Total time to wait for the first SQL file to appear in a new folder (30s)
/// Producers may create the folder well before they write its scripts
pub const DISCOVERY_MAX_WAIT: Duration = Duration::from_secs(30);

/// Lower bound for the poll interval so a zero setting cannot spin
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);
