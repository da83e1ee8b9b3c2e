//! Wall-clock sources for the presentation driver.
//!
//! The predictor never reads the clock itself; it is handed an instant.
//! The driver samples one of these sources on every tick, so tests can
//! swap in a [`ManualClock`] and step through time deterministically.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};

/// A source of "now".
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The host system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Stores milliseconds since the Unix epoch in an atomic so it can be
/// shared with a running driver and advanced from a test.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `instant`.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(instant.timestamp_millis()),
        }
    }

    /// Jump to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.millis.store(instant.timestamp_millis(), Ordering::Release);
    }

    /// Move forward (or backward, for a negative delta) by `delta`.
    /// Saturates instead of overflowing.
    pub fn advance(&self, delta: TimeDelta) {
        let step = delta.num_milliseconds();
        // fetch_update only fails if the closure returns None, which it never does.
        let _ = self
            .millis
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(step))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::Acquire)).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn manual_clock_holds_still() {
        let start = Utc.with_ymd_and_hms(2025, 1, 17, 2, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn manual_clock_advances_and_sets() {
        let start = Utc.with_ymd_and_hms(2025, 1, 17, 2, 0, 0).unwrap();
        let clock = ManualClock::new(start);

        clock.advance(TimeDelta::try_minutes(19).unwrap());
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 1, 17, 2, 19, 0).unwrap());

        clock.advance(TimeDelta::try_seconds(-30).unwrap());
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 1, 17, 2, 18, 30).unwrap());

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
