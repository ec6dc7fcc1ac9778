use chrono::{DateTime, Utc};

/// Milliseconds since the Unix epoch
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render an epoch millisecond timestamp; 0 is rendered as "never"
pub fn epoch_ms_to_iso(ms: i64) -> String {
    if ms == 0 {
        return "never".to_string();
    }
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}
