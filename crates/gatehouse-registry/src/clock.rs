//! Time source abstraction
//!
//! Abstracts access to the current time so escalation and pruning logic
//! can be driven by a manual clock in tests. Production code uses
//! [`SystemClock`].

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Trait for obtaining the current time
pub trait Clock: Send + Sync {
    /// Returns the current wall-clock time
    fn now(&self) -> DateTime<Utc>;
}

/// System clock delegating to `Utc::now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually-driven clock for deterministic tests
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to an absolute instant
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    /// Advance by a duration
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::starting_at(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(300));
        assert_eq!(clock.now(), start + Duration::seconds(300));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
