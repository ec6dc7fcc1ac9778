use std::time::Duration;

pub const LOG_LEVEL: &str = "info";

/// Longest coalesced read, in words
pub const MAX_READ_WORDS: u32 = 64;
pub const RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(50);
pub const RETRY_MAX_ELAPSED: Duration = Duration::from_secs(5);
pub const SAMPLE_MAX_AGE: Duration = Duration::from_secs(5);
