use chrono::{DateTime, Utc};

/// Wall clock in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;

    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms()).unwrap_or_default()
    }
}
