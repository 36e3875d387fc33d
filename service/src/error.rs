use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use abi::{ConflictInfo, ConflictReport, Error};

/// Everything a handler can fail with. Core errors carry their own
/// classification; `Unauthorized` only exists at the HTTP boundary.
#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    Unauthorized,
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Authentication required" }),
            ),
            ApiError::Core(e) => core_response(e),
        };
        (status, Json(body)).into_response()
    }
}

fn core_response(e: Error) -> (StatusCode, Value) {
    match e {
        Error::MissingField { ref fields } => {
            let details: Value = fields
                .iter()
                .map(|f| (camel_case(f), Value::from(format!("{} is required", title_case(f)))))
                .collect::<serde_json::Map<_, _>>()
                .into();
            (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "details": details }),
            )
        }
        Error::MalformedDate { .. } => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Validation failed",
                "details": "Invalid date format. Use ISO 8601 (e.g., \"2025-03-15T10:00:00Z\")"
            }),
        ),
        Error::InvalidOrder => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Validation failed", "details": "Start time must be before end time" }),
        ),
        Error::TooShort { .. } => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Validation failed", "details": "Booking must be at least 15 minutes long" }),
        ),
        Error::TooLong { .. } => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Validation failed", "details": "Booking cannot exceed 24 hours" }),
        ),
        Error::InvalidRole(_) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid role. Must be admin, owner, or user" }),
        ),
        Error::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
        Error::EmailInUse(_) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Email already in use" }),
        ),
        Error::ConstraintViolation(_) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Validation failed", "details": "Booking violates database constraints" }),
        ),
        Error::Conflict(ConflictInfo::Detected(report)) => {
            (StatusCode::CONFLICT, conflict_body(&report))
        }
        Error::Conflict(ConflictInfo::Constraint(_)) => (
            StatusCode::CONFLICT,
            json!({
                "error": "Duplicate booking",
                "details": "This booking conflicts with an existing booking"
            }),
        ),
        Error::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "Not found" })),
        Error::Forbidden(details) => (
            StatusCode::FORBIDDEN,
            json!({ "error": "Access denied", "details": details }),
        ),
        Error::Transient(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "error": "Temporary server issue",
                "details": "Please retry the request"
            }),
        ),
        // anything unclassified stays opaque to the caller
        other => {
            tracing::error!(error = %other, "unhandled store error");
            (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Server error" }))
        }
    }
}

fn conflict_body(report: &ConflictReport) -> Value {
    let conflicts: Vec<Value> = report
        .conflicts
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "start": c.start_time.to_rfc3339(),
                "end": c.end_time.to_rfc3339(),
                "bookedBy": if c.owned_by_requester { "you" } else { "another user" },
            })
        })
        .collect();
    json!({
        "error": "Booking conflict",
        "label": report.label,
        "details": format!("Your booking {} existing booking(s)", report.label.as_phrase()),
        "conflicts": conflicts,
    })
}

fn camel_case(field: &str) -> String {
    let mut parts = field.split('_');
    let mut out = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

fn title_case(field: &str) -> String {
    let words: Vec<String> = field
        .split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_rendering() {
        assert_eq!(camel_case("start_time"), "startTime");
        assert_eq!(camel_case("role"), "role");
        assert_eq!(title_case("start_time"), "Start Time");
    }

    #[test]
    fn status_mapping() {
        let (status, _) = core_response(Error::InvalidOrder);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = core_response(Error::NotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = core_response(Error::Forbidden("nope".into()));
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = core_response(Error::Transient("pool timeout".into()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let (status, _) = core_response(Error::Conflict(ConflictInfo::Constraint(
            "range overlap".into(),
        )));
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
