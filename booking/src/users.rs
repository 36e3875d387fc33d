use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use abi::{
    CreateUser, Role, User, UserListQuery, UserPage, UserProfile, UserWithStats,
};

use crate::{UserManager, UserStore};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    role: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse().unwrap_or(Role::User),
            is_deleted: row.is_deleted,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, role, is_deleted, created_at";

/// Only these columns may be sorted on; anything else falls back to
/// created_at.
fn sort_column(raw: Option<&str>) -> &'static str {
    match raw {
        Some("id") => "id",
        Some("name") => "name",
        Some("email") => "email",
        Some("role") => "role",
        Some("is_deleted") => "is_deleted",
        _ => "created_at",
    }
}

fn sort_order(raw: Option<&str>) -> &'static str {
    match raw {
        Some(o) if o.eq_ignore_ascii_case("asc") => "ASC",
        _ => "DESC",
    }
}

#[async_trait]
impl UserStore for UserManager {
    async fn create(&self, cmd: CreateUser) -> Result<User, abi::Error> {
        let new = cmd.validate()?;

        if let Some(email) = &new.email {
            let taken: Option<Uuid> = sqlx::query_scalar(
                "SELECT id FROM users WHERE email = $1 AND is_deleted = false",
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
            if taken.is_some() {
                return Err(abi::Error::EmailInUse(email.clone()));
            }
        }

        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}",
        ))
        .bind(&new.name)
        .bind(&new.email)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %row.id, role = %new.role, "user created");
        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<User, abi::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::from).ok_or(abi::Error::NotFound)
    }

    async fn profile(&self, id: Uuid) -> Result<UserProfile, abi::Error> {
        let user = self.get(id).await?;
        if user.is_deleted {
            return Err(abi::Error::Forbidden(
                "account deactivated; contact an administrator".into(),
            ));
        }

        #[derive(sqlx::FromRow)]
        struct StatsRow {
            total: i64,
            upcoming: i64,
        }
        let stats: StatsRow = sqlx::query_as(
            "SELECT COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE start_time > now()) AS upcoming \
             FROM bookings WHERE user_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserProfile {
            user,
            total_bookings: stats.total,
            upcoming_bookings: stats.upcoming,
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

        let mut clauses = Vec::new();
        let mut n = 0;
        if query.role.is_some() {
            n += 1;
            clauses.push(format!("u.role = ${n}"));
        }
        if !query.include_deleted {
            clauses.push("u.is_deleted = false".to_string());
        }
        let search_params = if query.search.is_some() {
            clauses.push(format!("(u.name ILIKE ${} OR u.email ILIKE ${})", n + 1, n + 2));
            n += 2;
            true
        } else {
            false
        };
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let data_sql = format!(
            "SELECT u.id, u.name, u.email, u.role, u.is_deleted, u.created_at, \
             COALESCE(bc.total, 0) AS total_bookings \
             FROM users u \
             LEFT JOIN (SELECT user_id, COUNT(*) AS total FROM bookings GROUP BY user_id) bc \
                 ON bc.user_id = u.id\
             {where_clause} \
             ORDER BY u.{} {} LIMIT ${} OFFSET ${}",
            sort_column(query.sort_by.as_deref()),
            sort_order(query.sort_order.as_deref()),
            n + 1,
            n + 2,
        );
        let count_sql = format!("SELECT COUNT(*) FROM users u{where_clause}");

        #[derive(sqlx::FromRow)]
        struct UserStatsRow {
            id: Uuid,
            name: String,
            email: Option<String>,
            role: String,
            is_deleted: bool,
            created_at: DateTime<Utc>,
            total_bookings: i64,
        }

        let mut data = sqlx::query_as::<_, UserStatsRow>(&data_sql);
        let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(role) = query.role {
            data = data.bind(role.as_str());
            count = count.bind(role.as_str());
        }
        if search_params {
            let pattern = format!("%{}%", query.search.as_deref().unwrap_or_default());
            data = data.bind(pattern.clone()).bind(pattern.clone());
            count = count.bind(pattern.clone()).bind(pattern);
        }

        let offset = (query.page - 1) * query.limit;
        let rows = data
            .bind(query.limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total = count.fetch_one(&self.pool).await?;

        Ok(UserPage {
            total,
            users: rows
                .into_iter()
                .map(|row| UserWithStats {
                    total_bookings: row.total_bookings,
                    user: User {
                        id: row.id,
                        name: row.name,
                        email: row.email,
                        role: row.role.parse().unwrap_or(Role::User),
                        is_deleted: row.is_deleted,
                        created_at: row.created_at,
                    },
                })
                .collect(),
        })
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<User, abi::Error> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET role = $1 WHERE id = $2 AND is_deleted = false \
             RETURNING {USER_COLUMNS}",
        ))
        .bind(role.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let user = row.map(User::from).ok_or(abi::Error::NotFound)?;
        tracing::info!(user_id = %id, new_role = %role, "user role updated");
        Ok(user)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), abi::Error> {
        let res = sqlx::query("UPDATE users SET is_deleted = true WHERE id = $1 AND is_deleted = false")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(abi::Error::NotFound);
        }
        tracing::info!(user_id = %id, "user soft-deleted");
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> Result<User, abi::Error> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET is_deleted = false WHERE id = $1 RETURNING {USER_COLUMNS}",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let user = row.map(User::from).ok_or(abi::Error::NotFound)?;
        tracing::info!(user_id = %id, "user restored");
        Ok(user)
    }

    async fn hard_delete(&self, id: Uuid) -> Result<(), abi::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM bookings WHERE user_id = $1")
            .bind(id)
            .execute(&mut tx)
            .await?;
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut tx)
            .await?;
        if res.rows_affected() == 0 {
            // dropping the transaction undoes the booking delete
            return Err(abi::Error::NotFound);
        }
        tx.commit().await?;
        tracing::info!(user_id = %id, "user permanently deleted");
        Ok(())
    }
}
