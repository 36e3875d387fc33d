mod manager;
mod users;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Booking store over PostgreSQL. All mutations run inside store-level
/// transactions; overlap prevention relies on serializable isolation with
/// the table's range-exclusion constraint as backstop.
#[derive(Debug, Clone)]
pub struct BookingManager {
    pool: PgPool,
}

/// User store over the same pool.
#[derive(Debug, Clone)]
pub struct UserManager {
    pool: PgPool,
}

impl BookingManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
pub trait Bookings: Send + Sync {
    /// validate the raw bounds, check the current reservation set for
    /// overlaps, and insert atomically
    async fn create(&self, cmd: abi::CreateBooking) -> Result<abi::Booking, abi::Error>;
    /// delete a booking on behalf of the requester; admins and owners may
    /// delete any booking, a plain user only their own
    async fn delete(
        &self,
        id: Uuid,
        requester: &abi::Principal,
    ) -> Result<abi::DeletedBooking, abi::Error>;
    /// list bookings with filters and pagination
    async fn list(&self, query: abi::BookingQuery) -> Result<abi::BookingPage, abi::Error>;
    /// per-user usage aggregates over a period
    async fn usage_summary(
        &self,
        period: abi::SummaryPeriod,
    ) -> Result<abi::UsageSummary, abi::Error>;
    /// every active user with their bookings
    async fn grouped_by_user(
        &self,
        query: abi::GroupedQuery,
    ) -> Result<Vec<abi::UserBookings>, abi::Error>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// create a user account
    async fn create(&self, cmd: abi::CreateUser) -> Result<abi::User, abi::Error>;
    /// get a user by id (soft-deleted included, flag visible)
    async fn get(&self, id: Uuid) -> Result<abi::User, abi::Error>;
    /// the caller's own record plus booking stats
    async fn profile(&self, id: Uuid) -> Result<abi::UserProfile, abi::Error>;
    /// paginated user index with filters and sorting
    async fn list(&self, query: abi::UserListQuery) -> Result<abi::UserPage, abi::Error>;
    /// change a user's role
    async fn update_role(&self, id: Uuid, role: abi::Role) -> Result<abi::User, abi::Error>;
    /// flag a user as deleted
    async fn soft_delete(&self, id: Uuid) -> Result<(), abi::Error>;
    /// clear the deleted flag
    async fn restore(&self, id: Uuid) -> Result<abi::User, abi::Error>;
    /// remove the user and their bookings for good
    async fn hard_delete(&self, id: Uuid) -> Result<(), abi::Error>;
}
