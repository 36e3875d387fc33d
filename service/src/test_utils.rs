//! In-memory store double backing the service tests. Implements the same
//! trait contracts as the PostgreSQL managers, sharing the validation and
//! classification logic with the real store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{Duration, Utc};
use uuid::Uuid;

use abi::{
    AuthConfig, Booking, BookingPage, BookingQuery, BookingView, ConflictInfo, ConflictRecord,
    ConflictReport, CreateBooking, CreateUser, DeletedBooking, GroupedQuery, Interval, Principal,
    Role, StaticToken, SummaryPeriod, UsageSummary, User, UserBookings, UserListQuery, UserPage,
    UserProfile, UserUsage, UserWithStats,
};
use booking::{Bookings, UserStore};
use booking_service::{app, AppState, StaticTokens};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    bookings: Vec<Booking>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, name: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: Some(format!("{name}@example.com")),
            role,
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn bookings_of(&self, user_id: Uuid) -> Vec<Booking> {
        self.inner
            .lock()
            .unwrap()
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Bookings for MemoryStore {
    async fn create(&self, cmd: CreateBooking) -> Result<Booking, abi::Error> {
        let interval = Interval::parse(cmd.start_time.as_deref(), cmd.end_time.as_deref())?;

        // the lock is the in-memory stand-in for the store's isolation:
        // scan and insert are one critical section
        let mut inner = self.inner.lock().unwrap();
        let mut conflicts: Vec<ConflictRecord> = inner
            .bookings
            .iter()
            .filter(|b| b.interval().overlaps(&interval))
            .map(|b| ConflictRecord {
                id: b.id,
                start_time: b.start_time,
                end_time: b.end_time,
                owner_id: b.user_id,
                owned_by_requester: b.user_id == cmd.user_id,
            })
            .collect();
        conflicts.sort_by_key(|c| c.start_time);

        if !conflicts.is_empty() {
            return Err(abi::Error::Conflict(ConflictInfo::Detected(
                ConflictReport::new(&interval, conflicts),
            )));
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: cmd.user_id,
            start_time: interval.start,
            end_time: interval.end,
            created_at: Utc::now(),
        };
        inner.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn delete(
        &self,
        id: Uuid,
        requester: &Principal,
    ) -> Result<DeletedBooking, abi::Error> {
        let mut inner = self.inner.lock().unwrap();
        let pos = inner
            .bookings
            .iter()
            .position(|b| b.id == id)
            .ok_or(abi::Error::NotFound)?;

        let owner_id = inner.bookings[pos].user_id;
        if !requester.role.can_delete_booking(requester.user_id, owner_id) {
            return Err(abi::Error::Forbidden(
                "you can only delete your own bookings".into(),
            ));
        }

        let owner_name = inner
            .users
            .iter()
            .find(|u| u.id == owner_id)
            .map(|u| u.name.clone())
            .unwrap_or_default();
        let booking = inner.bookings.remove(pos);
        Ok(DeletedBooking {
            id: booking.id,
            user_id: booking.user_id,
            start_time: booking.start_time,
            end_time: booking.end_time,
            owner_name,
        })
    }

    async fn list(&self, query: BookingQuery) -> Result<BookingPage, abi::Error> {
        let inner = self.inner.lock().unwrap();
        let mut views: Vec<BookingView> = inner
            .bookings
            .iter()
            .filter(|b| query.start_after.map_or(true, |t| b.start_time >= t))
            .filter(|b| query.end_before.map_or(true, |t| b.end_time <= t))
            .filter(|b| query.user_id.map_or(true, |u| b.user_id == u))
            .filter_map(|b| {
                let owner = inner
                    .users
                    .iter()
                    .find(|u| u.id == b.user_id && !u.is_deleted)?;
                Some(BookingView {
                    id: b.id,
                    user_id: b.user_id,
                    user_name: owner.name.clone(),
                    user_role: owner.role,
                    start_time: b.start_time,
                    end_time: b.end_time,
                    created_at: b.created_at,
                })
            })
            .collect();
        views.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        let total = views.len() as i64;
        let bookings = views
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();
        Ok(BookingPage { total, bookings })
    }

    async fn usage_summary(&self, period: SummaryPeriod) -> Result<UsageSummary, abi::Error> {
        let inner = self.inner.lock().unwrap();
        let cutoff = period.days().map(|d| Utc::now() - Duration::days(d));
        let mut users: Vec<UserUsage> = inner
            .users
            .iter()
            .filter(|u| !u.is_deleted)
            .map(|u| {
                let counted: Vec<&Booking> = inner
                    .bookings
                    .iter()
                    .filter(|b| b.user_id == u.id)
                    .filter(|b| cutoff.map_or(true, |c| b.created_at >= c))
                    .collect();
                UserUsage {
                    user_id: u.id,
                    user_name: u.name.clone(),
                    user_email: u.email.clone(),
                    user_role: u.role,
                    total_bookings: counted.len() as i64,
                    total_minutes: counted.iter().map(|b| b.duration_minutes()).sum(),
                }
            })
            .collect();
        users.sort_by(|a, b| {
            b.total_bookings
                .cmp(&a.total_bookings)
                .then_with(|| a.user_name.cmp(&b.user_name))
        });

        Ok(UsageSummary {
            period,
            total_bookings: users.iter().map(|u| u.total_bookings).sum(),
            active_users: users.iter().filter(|u| u.total_bookings > 0).count() as i64,
            users,
        })
    }

    async fn grouped_by_user(
        &self,
        query: GroupedQuery,
    ) -> Result<Vec<UserBookings>, abi::Error> {
        let inner = self.inner.lock().unwrap();
        let mut sorted_users: Vec<&User> =
            inner.users.iter().filter(|u| !u.is_deleted).collect();
        sorted_users.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(sorted_users
            .into_iter()
            .map(|u| {
                let mut bookings: Vec<Booking> = inner
                    .bookings
                    .iter()
                    .filter(|b| b.user_id == u.id)
                    .filter(|b| query.start_after.map_or(true, |t| b.start_time >= t))
                    .filter(|b| query.start_before.map_or(true, |t| b.start_time <= t))
                    .cloned()
                    .collect();
                bookings.sort_by_key(|b| b.start_time);
                UserBookings {
                    user_id: u.id,
                    user_name: u.name.clone(),
                    user_email: u.email.clone(),
                    user_role: u.role,
                    bookings,
                }
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, cmd: CreateUser) -> Result<User, abi::Error> {
        let new = cmd.validate()?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(email) = &new.email {
            if inner
                .users
                .iter()
                .any(|u| !u.is_deleted && u.email.as_deref() == Some(email))
            {
                return Err(abi::Error::EmailInUse(email.clone()));
            }
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            role: new.role,
            is_deleted: false,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> Result<User, abi::Error> {
        self.inner
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(abi::Error::NotFound)
    }

    async fn profile(&self, id: Uuid) -> Result<UserProfile, abi::Error> {
        let user = self.get(id).await?;
        if user.is_deleted {
            return Err(abi::Error::Forbidden(
                "account deactivated; contact an administrator".into(),
            ));
        }
        let inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let mine: Vec<&Booking> = inner
            .bookings
            .iter()
            .filter(|b| b.user_id == id)
            .collect();
        Ok(UserProfile {
            total_bookings: mine.len() as i64,
            upcoming_bookings: mine.iter().filter(|b| b.start_time > now).count() as i64,
            user,
        })
    }

    async fn list(&self, query: UserListQuery) -> Result<UserPage, abi::Error> {
        if query.page < 1 {
            return Err(abi::Error::InvalidQuery(
                "page must be a positive integer".into(),
            ));
        }
        if !(1..=100).contains(&query.limit) {
            return Err(abi::Error::InvalidQuery(
                "limit must be between 1 and 100".into(),
            ));
        }

        let inner = self.inner.lock().unwrap();
        let needle = query.search.as_deref().map(str::to_lowercase);
        let mut matching: Vec<&User> = inner
            .users
            .iter()
            .filter(|u| query.role.map_or(true, |r| u.role == r))
            .filter(|u| query.include_deleted || !u.is_deleted)
            .filter(|u| {
                needle.as_deref().map_or(true, |n| {
                    u.name.to_lowercase().contains(n)
                        || u.email
                            .as_deref()
                            .map_or(false, |e| e.to_lowercase().contains(n))
                })
            })
            .collect();

        let ascending = query
            .sort_order
            .as_deref()
            .map_or(false, |o| o.eq_ignore_ascii_case("asc"));
        match query.sort_by.as_deref() {
            Some("name") => matching.sort_by(|a, b| a.name.cmp(&b.name)),
            Some("email") => matching.sort_by(|a, b| a.email.cmp(&b.email)),
            Some("role") => matching.sort_by(|a, b| a.role.as_str().cmp(b.role.as_str())),
            _ => matching.sort_by_key(|u| u.created_at),
        }
        if !ascending {
            matching.reverse();
        }

        let total = matching.len() as i64;
        let start = ((query.page - 1) * query.limit) as usize;
        let users = matching
            .into_iter()
            .skip(start)
            .take(query.limit as usize)
            .map(|u| UserWithStats {
                total_bookings: inner
                    .bookings
                    .iter()
                    .filter(|b| b.user_id == u.id)
                    .count() as i64,
                user: u.clone(),
            })
            .collect();
        Ok(UserPage { total, users })
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<User, abi::Error> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id && !u.is_deleted)
            .ok_or(abi::Error::NotFound)?;
        user.role = role;
        Ok(user.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), abi::Error> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id && !u.is_deleted)
            .ok_or(abi::Error::NotFound)?;
        user.is_deleted = true;
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> Result<User, abi::Error> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(abi::Error::NotFound)?;
        user.is_deleted = false;
        Ok(user.clone())
    }

    async fn hard_delete(&self, id: Uuid) -> Result<(), abi::Error> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        if inner.users.len() == before {
            return Err(abi::Error::NotFound);
        }
        inner.bookings.retain(|b| b.user_id != id);
        Ok(())
    }
}

/// A fully wired router over the in-memory store, with one seeded user per
/// role and a bearer token for each.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub admin: User,
    pub owner: User,
    pub alice: User,
    pub bob: User,
}

pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let admin = store.seed_user("admin", Role::Admin);
    let owner = store.seed_user("owner", Role::Owner);
    let alice = store.seed_user("alice", Role::User);
    let bob = store.seed_user("bob", Role::User);

    let auth = AuthConfig {
        tokens: vec![
            static_token("admin-token", &admin),
            static_token("owner-token", &owner),
            static_token("alice-token", &alice),
            static_token("bob-token", &bob),
        ],
    };
    let state = AppState {
        bookings: store.clone(),
        users: store.clone(),
        verifier: Arc::new(StaticTokens::from_config(&auth)),
    };
    TestApp {
        app: app(state),
        store,
        admin,
        owner,
        alice,
        bob,
    }
}

fn static_token(token: &str, user: &User) -> StaticToken {
    StaticToken {
        token: token.into(),
        user_id: user.id,
        name: user.name.clone(),
        role: user.role,
    }
}
