//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Combines a calendar date with a time-of-day into a UTC timestamp.
    ///
    /// Class schedules are stored as (date, time-of-day) pairs; this is the
    /// single place they are joined into a point in time.
    pub fn from_date_time(date: NaiveDate, time: NaiveTime) -> Self {
        Self(Utc.from_utc_datetime(&date.and_time(time)))
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the calendar date component.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by adding the specified number of minutes.
    pub fn add_minutes(&self, minutes: i64) -> Self {
        Self(self.0 + Duration::minutes(minutes))
    }

    /// Returns the Monday of the ISO week containing the given date.
    ///
    /// Weekly booking caps count Monday through Sunday.
    pub fn week_start(date: NaiveDate) -> NaiveDate {
        date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
    }

    /// Returns the (Monday, Sunday) bounds of the ISO week containing a date.
    pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = Self::week_start(date);
        (start, start + Duration::days(6))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn from_date_time_combines_components() {
        let ts = Timestamp::from_date_time(
            date(2026, 3, 9),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
        );
        assert_eq!(ts.date(), date(2026, 3, 9));
        assert_eq!(ts.as_datetime().format("%H:%M").to_string(), "18:30");
    }

    #[test]
    fn add_days_moves_forward_and_back() {
        let ts = Timestamp::from_date_time(
            date(2026, 3, 9),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        );
        assert_eq!(ts.add_days(3).date(), date(2026, 3, 12));
        assert_eq!(ts.add_days(-9).date(), date(2026, 2, 28));
    }

    #[test]
    fn add_minutes_extends_within_day() {
        let ts = Timestamp::from_date_time(
            date(2026, 3, 9),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        );
        let end = ts.add_minutes(90);
        assert_eq!(end.as_datetime().format("%H:%M").to_string(), "19:30");
        assert!(end.is_after(&ts));
    }

    #[test]
    fn week_start_is_monday() {
        // 2026-03-11 is a Wednesday
        let wednesday = date(2026, 3, 11);
        assert_eq!(wednesday.weekday(), Weekday::Wed);
        assert_eq!(Timestamp::week_start(wednesday), date(2026, 3, 9));

        // A Monday maps to itself
        assert_eq!(Timestamp::week_start(date(2026, 3, 9)), date(2026, 3, 9));

        // A Sunday maps back to the preceding Monday
        assert_eq!(Timestamp::week_start(date(2026, 3, 15)), date(2026, 3, 9));
    }

    #[test]
    fn week_bounds_span_monday_to_sunday() {
        let (start, end) = Timestamp::week_bounds(date(2026, 3, 11));
        assert_eq!(start, date(2026, 3, 9));
        assert_eq!(end, date(2026, 3, 15));
    }

    #[test]
    fn ordering_follows_chronology() {
        let earlier = Timestamp::from_date_time(
            date(2026, 1, 1),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        );
        let later = earlier.add_days(1);
        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert!(earlier < later);
    }
}
