use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Closed set of roles. Authorization decisions match exhaustively on this
/// instead of comparing strings at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Owner,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::User => "user",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn is_admin_or_owner(self) -> bool {
        match self {
            Role::Admin | Role::Owner => true,
            Role::User => false,
        }
    }

    /// Admins and owners may delete any booking; a plain user only their own.
    pub fn can_delete_booking(self, requester_id: Uuid, booking_owner_id: Uuid) -> bool {
        match self {
            Role::Admin | Role::Owner => true,
            Role::User => requester_id == booking_owner_id,
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            "user" => Ok(Role::User),
            other => Err(Error::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller of a request. Token verification happens
/// upstream; the core trusts this as already verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
}

/// Raw user-creation input; presence and role validity are checked by the
/// store before anything touches the database.
#[derive(Debug, Clone, Default)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl CreateUser {
    pub fn validate(self) -> Result<NewUser, Error> {
        let mut missing = Vec::new();
        if self.name.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("name");
        }
        if self.role.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("role");
        }
        if !missing.is_empty() {
            return Err(Error::MissingField { fields: missing });
        }
        Ok(NewUser {
            name: self.name.unwrap(),
            email: self.email.filter(|e| !e.trim().is_empty()),
            role: self.role.unwrap().parse()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Listing parameters for the user index. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct UserListQuery {
    pub page: i64,
    pub limit: i64,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub role: Option<Role>,
    pub search: Option<String>,
    pub include_deleted: bool,
}

impl Default for UserListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort_by: None,
            sort_order: None,
            role: None,
            search: None,
            include_deleted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWithStats {
    pub user: User,
    pub total_bookings: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPage {
    pub total: i64,
    pub users: Vec<UserWithStats>,
}

/// A user's own record plus booking stats, for the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user: User,
    pub total_bookings: i64,
    pub upcoming_bookings: i64,
}
