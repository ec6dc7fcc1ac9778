mod backoff_retry;
mod load_dotenv;
mod time;

pub use backoff_retry::backoff_retry;
pub use load_dotenv::load_dotenv;
pub use time::{epoch_ms_to_iso, now_epoch_ms};
