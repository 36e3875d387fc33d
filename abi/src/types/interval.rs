use chrono::{DateTime, Duration, Utc};

use crate::Error;

/// Shortest booking we accept.
pub const MIN_DURATION_MINUTES: i64 = 15;
/// Longest booking we accept.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

/// A half-open time range `[start, end)`. Only ever constructed through
/// validation, so holders can rely on `start < end` and the duration bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Validate the raw request fields into an interval. Checks run in
    /// order and stop at the first failure: presence, parseability,
    /// ordering, minimum duration, maximum duration.
    pub fn parse(start_raw: Option<&str>, end_raw: Option<&str>) -> Result<Self, Error> {
        let mut missing = Vec::new();
        if start_raw.map_or(true, |s| s.trim().is_empty()) {
            missing.push("start_time");
        }
        if end_raw.map_or(true, |s| s.trim().is_empty()) {
            missing.push("end_time");
        }
        if !missing.is_empty() {
            return Err(Error::MissingField { fields: missing });
        }

        let start = parse_instant("start_time", start_raw.unwrap())?;
        let end = parse_instant("end_time", end_raw.unwrap())?;
        Self::new(start, end)
    }

    /// Validate already-parsed instants (ordering and duration bounds).
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, Error> {
        if start >= end {
            return Err(Error::InvalidOrder);
        }
        let duration = end - start;
        if duration < Duration::minutes(MIN_DURATION_MINUTES) {
            return Err(Error::TooShort {
                minutes: duration.num_minutes(),
            });
        }
        if duration > Duration::minutes(MAX_DURATION_MINUTES) {
            return Err(Error::TooLong {
                minutes: duration.num_minutes(),
            });
        }
        Ok(Self { start, end })
    }

    /// Half-open overlap: back-to-back intervals do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

fn parse_instant(field: &'static str, raw: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::MalformedDate {
            field,
            value: raw.to_string(),
        })
}
