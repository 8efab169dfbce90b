//! # Temporal Module
//!
//! Day-resolution interval arithmetic for reference-segment validity windows and
//! provider observation periods. Every interval is half-open `[start, end)`, so a
//! segment ending on the day another begins does not overlap it.

use serde::{Deserialize, Serialize};
use std::cmp::{max, min, Ordering};
use std::fmt;
use time::{Date, Month};

/// A calendar day expressed as a Julian day number.
pub type Day = i64;

/// Sentinel values for open-ended intervals.
pub const NEG_INF: Day = i64::MIN;
pub const POS_INF: Day = i64::MAX;

/// A temporal interval [start, end) measured in days, where start < end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    /// First day (inclusive)
    pub start: Day,
    /// Day after the last day (exclusive)
    pub end: Day,
}

impl Interval {
    /// Create a new interval with validation
    ///
    /// # Errors
    /// Returns an error if start >= end (zero-length intervals are not allowed)
    pub fn new(start: Day, end: Day) -> anyhow::Result<Self> {
        if start >= end {
            anyhow::bail!(
                "Invalid interval: start ({}) must be less than end ({})",
                start,
                end
            );
        }
        Ok(Self { start, end })
    }

    /// Create an interval from calendar dates; `None` as the end means open-ended.
    pub fn from_dates(start: Date, end: Option<Date>) -> anyhow::Result<Self> {
        match end {
            Some(end) => Self::new(day_number(start), day_number(end)),
            None => Ok(Self::from_start(day_number(start))),
        }
    }

    /// The full calendar year `[Jan 1 year, Jan 1 year+1)`.
    pub fn calendar_year(year: i32) -> Option<Self> {
        let start = Date::from_calendar_date(year, Month::January, 1).ok()?;
        let end = Date::from_calendar_date(year.checked_add(1)?, Month::January, 1).ok()?;
        Some(Self {
            start: day_number(start),
            end: day_number(end),
        })
    }

    /// A single-day interval `[date, date + 1)`.
    pub fn single_day(date: Date) -> Self {
        let start = day_number(date);
        Self {
            start,
            end: start + 1,
        }
    }

    /// Create an open-ended interval starting from a specific day
    pub fn from_start(start: Day) -> Self {
        Self {
            start,
            end: POS_INF,
        }
    }

    /// Check if this interval contains a specific day
    pub fn contains(&self, day: Day) -> bool {
        self.start <= day && day < self.end
    }

    /// Length in days, `None` for intervals with an infinite endpoint
    pub fn duration(&self) -> Option<i64> {
        if self.start == NEG_INF || self.end == POS_INF {
            None
        } else {
            Some(self.end - self.start)
        }
    }

    /// Number of days shared with `other`; 0 when they only touch or are disjoint.
    #[inline]
    pub fn overlap_days(&self, other: &Interval) -> i64 {
        intersect(self, other)
            .and_then(|shared| shared.duration())
            .unwrap_or(0)
    }

    /// First day as a calendar date, if representable.
    pub fn start_date(&self) -> Option<Date> {
        date_from_day(self.start)
    }

    /// Exclusive end as a calendar date; `None` when open-ended.
    pub fn end_date(&self) -> Option<Date> {
        date_from_day(self.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start_str = match self.start_date() {
            Some(date) => format!("[{}", date),
            None => "(-∞".to_string(),
        };
        let end_str = match self.end_date() {
            Some(date) => format!("{})", date),
            None => "+∞)".to_string(),
        };
        write!(f, "{}, {}", start_str, end_str)
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.start.cmp(&other.start) {
            Ordering::Equal => self.end.cmp(&other.end),
            ordering => ordering,
        }
    }
}

/// Julian day number of a calendar date.
#[inline]
pub fn day_number(date: Date) -> Day {
    date.to_julian_day() as Day
}

/// Calendar date for a day number, `None` for sentinels and out-of-range days.
pub fn date_from_day(day: Day) -> Option<Date> {
    if day == NEG_INF || day == POS_INF {
        return None;
    }
    let julian = i32::try_from(day).ok()?;
    Date::from_julian_day(julian).ok()
}

/// Check if two intervals overlap
#[inline]
pub fn is_overlapping(a: &Interval, b: &Interval) -> bool {
    // Half-open intervals overlap unless one ends at or before the other's start.
    a.start < b.end && b.start < a.end
}

/// Compute the intersection of two intervals
/// Returns None if the intervals don't overlap
pub fn intersect(a: &Interval, b: &Interval) -> Option<Interval> {
    let start = max(a.start, b.start);
    let end = min(a.end, b.end);

    if start < end {
        Some(Interval { start, end })
    } else {
        None
    }
}

/// Overlap between an observation window and a validity window.
///
/// Returns `None` ("no overlap") when the intervals are disjoint or merely touch,
/// otherwise the shared length in days, which is always positive.
pub fn overlap_days(observation: &Interval, validity: &Interval) -> Option<i64> {
    match observation.overlap_days(validity) {
        0 => None,
        days => Some(days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_interval_validation() {
        assert!(Interval::new(100, 100).is_err());
        assert!(Interval::new(200, 100).is_err());
        assert!(Interval::new(100, 101).is_ok());
    }

    #[test]
    fn test_calendar_year_lengths() {
        let leap = Interval::calendar_year(2020).unwrap();
        let common = Interval::calendar_year(2021).unwrap();
        assert_eq!(leap.duration(), Some(366));
        assert_eq!(common.duration(), Some(365));
        assert_eq!(leap.end, common.start);
    }

    #[test]
    fn test_single_day() {
        let day = Interval::single_day(date!(2021 - 06 - 30));
        assert_eq!(day.duration(), Some(1));
        assert!(day.contains(day_number(date!(2021 - 06 - 30))));
        assert!(!day.contains(day_number(date!(2021 - 07 - 01))));
    }

    #[test]
    fn test_overlap_with_open_ended_segment() {
        let year = Interval::calendar_year(2020).unwrap();
        let segment = Interval::from_dates(date!(2015 - 01 - 01), None).unwrap();
        assert_eq!(overlap_days(&year, &segment), Some(366));
        assert_eq!(segment.duration(), None);
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let year = Interval::calendar_year(2020).unwrap();
        let ends_at_start =
            Interval::from_dates(date!(2019 - 01 - 01), Some(date!(2020 - 01 - 01))).unwrap();
        let starts_at_end = Interval::from_dates(date!(2021 - 01 - 01), None).unwrap();
        assert_eq!(overlap_days(&year, &ends_at_start), None);
        assert_eq!(overlap_days(&year, &starts_at_end), None);
    }

    #[test]
    fn test_partial_overlap() {
        let year = Interval::calendar_year(2021).unwrap();
        let segment =
            Interval::from_dates(date!(2021 - 12 - 01), Some(date!(2022 - 03 - 01))).unwrap();
        assert_eq!(overlap_days(&year, &segment), Some(31));
    }

    #[test]
    fn test_intersection() {
        let a = Interval::new(100, 200).unwrap();
        let b = Interval::new(150, 250).unwrap();
        let c = Interval::new(300, 400).unwrap();

        let intersection = intersect(&a, &b).unwrap();
        assert_eq!(intersection.start, 150);
        assert_eq!(intersection.end, 200);
        assert!(intersect(&a, &c).is_none());
        assert!(is_overlapping(&a, &b));
        assert!(!is_overlapping(&a, &c));
    }

    #[test]
    fn test_display_uses_dates() {
        let interval = Interval::from_dates(date!(2015 - 01 - 01), None).unwrap();
        assert_eq!(interval.to_string(), "[2015-01-01, +∞)");
    }
}
