use sqlx::postgres::PgDatabaseError;

use crate::ConflictReport;

// PostgreSQL SQLSTATE codes this service reacts to.
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const EXCLUSION_VIOLATION: &str = "23P01";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const QUERY_CANCELED: &str = "57014";

/// What we know about a booking conflict. `Detected` carries the full
/// report from the overlap scan; `Constraint` is the raced case where the
/// store's exclusion constraint fired before the scan could see the row,
/// so only the raw detail string is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictInfo {
    Detected(ConflictReport),
    Constraint(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing required field(s): {}", fields.join(", "))]
    MissingField { fields: Vec<&'static str> },

    #[error("invalid {field}: {value:?} is not an ISO 8601 date-time")]
    MalformedDate { field: &'static str, value: String },

    #[error("start time must be before end time")]
    InvalidOrder,

    #[error("booking must be at least 15 minutes long")]
    TooShort { minutes: i64 },

    #[error("booking cannot exceed 24 hours")]
    TooLong { minutes: i64 },

    #[error("invalid role: {0:?} (must be admin, owner, or user)")]
    InvalidRole(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("email already in use: {0}")]
    EmailInUse(String),

    #[error("booking conflict")]
    Conflict(ConflictInfo),

    #[error("not found")]
    NotFound,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("transient store failure: {0}")]
    Transient(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("failed to read config file")]
    ConfigRead(#[source] std::io::Error),

    #[error("failed to parse config file")]
    ConfigParse(#[source] serde_yaml::Error),
}

impl Error {
    /// Validation-class errors are always safe to report verbatim and are
    /// never worth retrying.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingField { .. }
                | Error::MalformedDate { .. }
                | Error::InvalidOrder
                | Error::TooShort { .. }
                | Error::TooLong { .. }
                | Error::InvalidRole(_)
                | Error::InvalidQuery(_)
                | Error::EmailInUse(_)
                | Error::ConstraintViolation(_)
        )
    }

    /// Transient failures may be retried from validation onward; nothing
    /// else should be.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Error::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Error::Transient(e.to_string())
            }
            sqlx::Error::Io(io) => Error::Transient(io.to_string()),
            sqlx::Error::Database(db) => classify_db_error(db),
            other => Error::Database(other),
        }
    }
}

fn classify_db_error(err: Box<dyn sqlx::error::DatabaseError>) -> Error {
    if let Some(pg) = err.try_downcast_ref::<PgDatabaseError>() {
        let detail = || {
            pg.detail()
                .map(str::to_string)
                .unwrap_or_else(|| pg.message().to_string())
        };
        match pg.code() {
            EXCLUSION_VIOLATION => {
                return Error::Conflict(ConflictInfo::Constraint(detail()));
            }
            UNIQUE_VIOLATION => {
                // users.email carries the only unique constraint besides
                // primary keys; everything else is a booking conflict
                if pg.constraint().map_or(false, |c| c.starts_with("users_")) {
                    return Error::EmailInUse(detail());
                }
                return Error::Conflict(ConflictInfo::Constraint(detail()));
            }
            CHECK_VIOLATION => {
                let constraint = pg.constraint().unwrap_or("check constraint");
                return Error::ConstraintViolation(constraint.to_string());
            }
            SERIALIZATION_FAILURE | DEADLOCK_DETECTED | QUERY_CANCELED => {
                return Error::Transient(pg.message().to_string());
            }
            _ => {}
        }
    }
    Error::Database(sqlx::Error::Database(err))
}

// sqlx::Error is not PartialEq, so equality is hand-written for test
// assertions; the Database and Config variants never compare equal.
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        use Error::*;
        match (self, other) {
            (MissingField { fields: a }, MissingField { fields: b }) => a == b,
            (
                MalformedDate { field: af, value: av },
                MalformedDate { field: bf, value: bv },
            ) => af == bf && av == bv,
            (InvalidOrder, InvalidOrder) => true,
            (TooShort { minutes: a }, TooShort { minutes: b }) => a == b,
            (TooLong { minutes: a }, TooLong { minutes: b }) => a == b,
            (InvalidRole(a), InvalidRole(b)) => a == b,
            (InvalidQuery(a), InvalidQuery(b)) => a == b,
            (EmailInUse(a), EmailInUse(b)) => a == b,
            (Conflict(a), Conflict(b)) => a == b,
            (NotFound, NotFound) => true,
            (Forbidden(a), Forbidden(b)) => a == b,
            (ConstraintViolation(a), ConstraintViolation(b)) => a == b,
            (Transient(a), Transient(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConflictLabel, ConflictRecord, Interval};
    use uuid::Uuid;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert_eq!(Error::from(sqlx::Error::RowNotFound), Error::NotFound);
    }

    #[test]
    fn pool_timeout_is_transient() {
        let err = Error::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());
        assert!(matches!(err, Error::Transient(_)));
    }

    #[test]
    fn validation_classification() {
        assert!(Error::InvalidOrder.is_validation());
        assert!(Error::TooShort { minutes: 5 }.is_validation());
        assert!(!Error::NotFound.is_validation());
        assert!(!Error::Forbidden("nope".into()).is_validation());
        assert!(!Error::InvalidOrder.is_retryable());
    }

    #[test]
    fn conflict_info_compares_by_content() {
        let candidate = Interval::new(
            "2025-03-15T10:00:00Z".parse().unwrap(),
            "2025-03-15T11:00:00Z".parse().unwrap(),
        )
        .unwrap();
        let record = ConflictRecord {
            id: Uuid::new_v4(),
            start_time: candidate.start,
            end_time: candidate.end,
            owner_id: Uuid::new_v4(),
            owned_by_requester: true,
        };
        let a = ConflictInfo::Detected(ConflictReport::new(&candidate, vec![record.clone()]));
        let b = ConflictInfo::Detected(ConflictReport::new(&candidate, vec![record]));
        assert_eq!(a, b);
        if let ConflictInfo::Detected(report) = a {
            assert_eq!(report.label, ConflictLabel::Exact);
        }
    }
}
