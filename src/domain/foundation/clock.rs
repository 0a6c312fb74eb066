//! Clock abstraction over the current time and date.
//!
//! Recurrence expansion and cap windows are anchored to "today", so
//! production code injects [`SystemClock`] and tests inject [`FixedClock`]
//! for deterministic behaviour.

use chrono::NaiveDate;

use super::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;

    /// Returns the current calendar date (UTC).
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Test clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn system_clock_tracks_real_time() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(a <= b);
    }

    #[test]
    fn fixed_clock_never_advances() {
        let pinned = Timestamp::from_date_time(
            NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        );
        let clock = FixedClock(pinned);
        assert_eq!(clock.now(), pinned);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
    }
}
