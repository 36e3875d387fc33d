use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Interval, Role};

/// A persisted reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn interval(&self) -> Interval {
        // persisted rows always passed validation
        Interval {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// A booking joined with its owner, as listed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_role: Role,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl BookingView {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// Snapshot returned after a successful delete, for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedBooking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub owner_name: String,
}

/// Create command carrying the raw, not-yet-validated time bounds.
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub user_id: Uuid,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Filters for the booking index.
#[derive(Debug, Clone)]
pub struct BookingQuery {
    /// keep bookings starting at or after this instant
    pub start_after: Option<DateTime<Utc>>,
    /// keep bookings ending at or before this instant
    pub end_before: Option<DateTime<Utc>>,
    pub user_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for BookingQuery {
    fn default() -> Self {
        Self {
            start_after: None,
            end_before: None,
            user_id: None,
            limit: 50,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingPage {
    pub total: i64,
    pub bookings: Vec<BookingView>,
}

/// Time window for the usage summary, keyed on booking creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryPeriod {
    All,
    Week,
    Month,
    Year,
}

impl SummaryPeriod {
    /// Unknown values fall back to the full history.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("week") => SummaryPeriod::Week,
            Some("month") => SummaryPeriod::Month,
            Some("year") => SummaryPeriod::Year,
            _ => SummaryPeriod::All,
        }
    }

    pub fn days(self) -> Option<i64> {
        match self {
            SummaryPeriod::All => None,
            SummaryPeriod::Week => Some(7),
            SummaryPeriod::Month => Some(30),
            SummaryPeriod::Year => Some(365),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SummaryPeriod::All => "all",
            SummaryPeriod::Week => "week",
            SummaryPeriod::Month => "month",
            SummaryPeriod::Year => "year",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUsage {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_role: Role,
    pub total_bookings: i64,
    pub total_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSummary {
    pub period: SummaryPeriod,
    pub total_bookings: i64,
    pub active_users: i64,
    pub users: Vec<UserUsage>,
}

/// Optional window for the grouped-by-user listing; both bounds apply to
/// the bookings' start times.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupedQuery {
    pub start_after: Option<DateTime<Utc>>,
    pub start_before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBookings {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_role: Role,
    pub bookings: Vec<Booking>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_period_parses_known_values_and_defaults() {
        assert_eq!(SummaryPeriod::parse(Some("week")), SummaryPeriod::Week);
        assert_eq!(SummaryPeriod::parse(Some("month")), SummaryPeriod::Month);
        assert_eq!(SummaryPeriod::parse(Some("year")), SummaryPeriod::Year);
        assert_eq!(SummaryPeriod::parse(Some("decade")), SummaryPeriod::All);
        assert_eq!(SummaryPeriod::parse(None), SummaryPeriod::All);
        assert_eq!(SummaryPeriod::Week.days(), Some(7));
        assert_eq!(SummaryPeriod::All.days(), None);
    }
}
