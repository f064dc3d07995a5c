//! Time source for staleness decisions

#[cfg(test)]
use mockall::automock;

/// Provides the current time in milliseconds since the UNIX epoch
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
