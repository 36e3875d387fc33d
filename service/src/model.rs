use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use abi::{
    Booking, BookingPage, BookingView, DeletedBooking, Role, UsageSummary, User, UserBookings,
    UserPage, UserProfile, UserUsage, UserWithStats,
};

// ── bookings ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingBody {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl From<Booking> for BookingBody {
    fn from(b: Booking) -> Self {
        Self {
            duration_minutes: b.duration_minutes(),
            id: b.id,
            user_id: b.user_id,
            start_time: b.start_time,
            end_time: b.end_time,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub message: &'static str,
    pub booking: BookingBody,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_role: Role,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl From<BookingView> for BookingListItem {
    fn from(b: BookingView) -> Self {
        Self {
            duration_minutes: b.duration_minutes(),
            id: b.id,
            user_id: b.user_id,
            user_name: b.user_name,
            user_role: b.user_role,
            start_time: b.start_time,
            end_time: b.end_time,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
    pub remaining: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsResponse {
    pub total: i64,
    pub bookings: Vec<BookingListItem>,
    pub pagination: PaginationMeta,
}

impl ListBookingsResponse {
    pub fn new(page: BookingPage, limit: i64, offset: i64) -> Self {
        let remaining = (page.total - (offset + limit)).max(0);
        Self {
            total: page.total,
            bookings: page.bookings.into_iter().map(Into::into).collect(),
            pagination: PaginationMeta {
                limit,
                offset,
                total: page.total,
                remaining,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBookingResponse {
    pub message: &'static str,
    pub deleted_booking: DeletedBookingBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedBookingBody {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub owner: String,
    pub deleted_by: String,
}

impl DeletedBookingBody {
    pub fn new(deleted: DeletedBooking, deleted_by: String) -> Self {
        Self {
            id: deleted.id,
            start_time: deleted.start_time,
            end_time: deleted.end_time,
            owner: deleted.owner_name,
            deleted_by,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummaryResponse {
    pub success: bool,
    pub summary: SummaryBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBody {
    pub period: &'static str,
    pub total_bookings: i64,
    pub active_users: i64,
    pub users: Vec<UserUsageBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUsageBody {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_role: Role,
    pub total_bookings: i64,
    pub total_minutes: i64,
    pub total_hours: String,
}

impl From<UserUsage> for UserUsageBody {
    fn from(u: UserUsage) -> Self {
        Self {
            total_hours: format!("{:.1}", u.total_minutes as f64 / 60.0),
            user_id: u.user_id,
            user_name: u.user_name,
            user_email: u.user_email,
            user_role: u.user_role,
            total_bookings: u.total_bookings,
            total_minutes: u.total_minutes,
        }
    }
}

impl From<UsageSummary> for UsageSummaryResponse {
    fn from(s: UsageSummary) -> Self {
        Self {
            success: true,
            summary: SummaryBody {
                period: s.period.as_str(),
                total_bookings: s.total_bookings,
                active_users: s.active_users,
                users: s.users.into_iter().map(Into::into).collect(),
            },
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupedParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedResponse {
    pub total_users: usize,
    pub users_with_bookings: usize,
    pub data: Vec<UserBookingsBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBookingsBody {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_role: Role,
    pub total_bookings: usize,
    pub bookings: Vec<BookingBody>,
}

impl From<Vec<UserBookings>> for GroupedResponse {
    fn from(groups: Vec<UserBookings>) -> Self {
        let data: Vec<UserBookingsBody> = groups
            .into_iter()
            .map(|g| UserBookingsBody {
                user_id: g.user_id,
                user_name: g.user_name,
                user_email: g.user_email,
                user_role: g.user_role,
                total_bookings: g.bookings.len(),
                bookings: g.bookings.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self {
            total_users: data.len(),
            users_with_bookings: data.iter().filter(|u| u.total_bookings > 0).count(),
            data,
        }
    }
}

// ── users ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserBody {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            is_deleted: u.is_deleted,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub role: Option<String>,
    pub search: Option<String>,
    pub include_deleted: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    #[serde(flatten)]
    pub user: UserBody,
    pub total_bookings: i64,
}

impl From<UserWithStats> for UserListItem {
    fn from(u: UserWithStats) -> Self {
        Self {
            user: u.user.into(),
            total_bookings: u.total_bookings,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPagination {
    pub page: i64,
    pub limit: i64,
    pub total_users: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub success: bool,
    pub data: Vec<UserListItem>,
    pub pagination: UserPagination,
}

impl ListUsersResponse {
    pub fn new(page: UserPage, page_num: i64, limit: i64) -> Self {
        let total_pages = (page.total + limit - 1) / limit;
        Self {
            success: true,
            data: page.users.into_iter().map(Into::into).collect(),
            pagination: UserPagination {
                page: page_num,
                limit,
                total_users: page.total,
                total_pages,
                has_next_page: page_num < total_pages,
                has_prev_page: page_num > 1,
            },
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserBody,
    pub stats: ProfileStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total_bookings: i64,
    pub upcoming_bookings: i64,
}

impl From<UserProfile> for ProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            success: true,
            user: p.user.into(),
            stats: ProfileStats {
                total_bookings: p.total_bookings,
                upcoming_bookings: p.upcoming_bookings,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Parse an optional RFC 3339 query-string instant; the field name feeds
/// the validation error on bad input.
pub fn parse_query_instant(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, abi::Error> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| abi::Error::MalformedDate {
                field,
                value: s.to_string(),
            }),
    }
}
