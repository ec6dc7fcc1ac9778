pub const LOG_LEVEL: &str = "LOG_LEVEL";

pub const MAX_READ_WORDS: &str = "REGCACHE_MAX_READ_WORDS";
pub const RETRY_TIMEOUT_MS: &str = "REGCACHE_RETRY_TIMEOUT_MS";
pub const SAMPLE_MAX_AGE_MS: &str = "REGCACHE_SAMPLE_MAX_AGE_MS";

/// Extra dotenv file loaded after the local `.env`
pub const DOTENV_PATH: &str = "REGCACHE_DOTENV";
