use std::time::{Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::models::Timestamp;

/// Source of "now" for everything session-scoped.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds
    fn now_millis(&self) -> Timestamp;
}

/// Wall-anchored monotonic clock.
///
/// Reads never go backwards even if the system time is adjusted.
#[derive(Debug)]
pub struct SystemClock {
    epoch_ms: Timestamp,
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Timestamp)
            .unwrap_or(0);

        SystemClock {
            epoch_ms,
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> Timestamp {
        self.epoch_ms + self.origin.elapsed().as_millis() as Timestamp
    }
}

/// Manually driven clock for tests and event replay
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, millis: Timestamp) {
        *self.now.lock() += millis;
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Timestamp {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now_millis();
        let second = clock.now_millis();
        assert!(second >= first);
        assert!(first > 1_600_000_000_000);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_millis(), 1_000);
        clock.advance(250);
        assert_eq!(clock.now_millis(), 1_250);
        clock.set(5_000);
        assert_eq!(clock.now_millis(), 5_000);
    }
}
