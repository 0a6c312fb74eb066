//! Pure expansion of a weekly recurrence into candidate occurrence dates.
//!
//! Walks the horizon day by day and keeps the dates whose weekday is
//! active and which fall inside the template's effective window. The
//! caller is responsible for filtering out dates that already have a
//! generated session.

use chrono::{Datelike, Duration, NaiveDate};

use super::Recurrence;

/// Returns every date in `[today, today + horizon_days]` on which the
/// recurrence produces an occurrence.
///
/// The effective window is clamped to the horizon: a `start_date` in the
/// past is bumped to `today`, an `end_date` beyond the horizon is ignored.
/// An empty weekday set or an inverted window yields no dates.
pub fn occurrence_dates(
    recurrence: &Recurrence,
    today: NaiveDate,
    horizon_days: u32,
) -> Vec<NaiveDate> {
    if recurrence.weekdays.is_empty() {
        return Vec::new();
    }

    let limit = today + Duration::days(i64::from(horizon_days));
    let start = recurrence.start_date.map_or(today, |d| d.max(today));
    let end = recurrence.end_date.map_or(limit, |d| d.min(limit));
    if start > end {
        return Vec::new();
    }

    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        if recurrence.weekdays.contains(current.weekday()) {
            dates.push(current);
        }
        current += Duration::days(1);
    }
    dates
}
