#[path = "../src/test_utils.rs"]
mod test_utils;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use abi::Config;
use test_utils::test_app;

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_booking(app: &Router, token: &str, start: &str, end: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/bookings",
        Some(token),
        Some(json!({ "startTime": start, "endTime": end })),
    )
    .await
}

#[test]
fn config_fixture_parses() {
    let config = Config::load("fixtures/config.yml").unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.auth.tokens.len(), 1);
}

#[tokio::test]
async fn health_reports_ok() {
    let t = test_app();
    let (status, body) = send(&t.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn booking_requires_bearer_token() {
    let t = test_app();
    let (status, _) = send(&t.app, "POST", "/api/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = create_booking(
        &t.app,
        "no-such-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn create_booking_returns_created_booking() {
    let t = test_app();
    let (status, body) = create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Booking created successfully");
    assert_eq!(body["booking"]["userId"], json!(t.alice.id));
    assert_eq!(body["booking"]["durationMinutes"], 60);
}

#[tokio::test]
async fn create_booking_validation_failures() {
    let t = test_app();

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/bookings",
        Some("alice-token"),
        Some(json!({ "startTime": "2030-03-15T10:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"]["endTime"], "End Time is required");

    let (status, body) = create_booking(
        &t.app,
        "alice-token",
        "next tuesday",
        "2030-03-15T11:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("ISO 8601"));

    let (status, body) = create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T11:00:00Z",
        "2030-03-15T10:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Start time must be before end time");

    let (status, body) = create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T10:10:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Booking must be at least 15 minutes long");

    let (status, body) = create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-16T11:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Booking cannot exceed 24 hours");
}

#[tokio::test]
async fn exact_duplicate_is_rejected_with_conflict() {
    let t = test_app();
    let (status, _) = create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create_booking(
        &t.app,
        "bob-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Booking conflict");
    assert_eq!(body["label"], "exact");
    assert_eq!(
        body["details"],
        "Your booking exactly matches existing booking(s)"
    );
    assert_eq!(body["conflicts"][0]["bookedBy"], "another user");
}

#[tokio::test]
async fn nested_booking_reports_within() {
    let t = test_app();
    create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;

    let (status, body) = create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:30:00Z",
        "2030-03-15T10:45:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["label"], "within");
    assert_eq!(body["conflicts"][0]["bookedBy"], "you");
}

#[tokio::test]
async fn surrounding_booking_reports_contains() {
    let t = test_app();
    create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T10:30:00Z",
    )
    .await;

    let (status, body) = create_booking(
        &t.app,
        "bob-token",
        "2030-03-15T09:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["label"], "contains");
}

#[tokio::test]
async fn back_to_back_is_allowed_but_partial_overlap_is_not() {
    let t = test_app();
    create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;

    // [11:00, 12:00) touches [10:00, 11:00) only at the boundary
    let (status, _) = create_booking(
        &t.app,
        "bob-token",
        "2030-03-15T11:00:00Z",
        "2030-03-15T12:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create_booking(
        &t.app,
        "bob-token",
        "2030-03-15T10:30:00Z",
        "2030-03-15T11:30:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["label"], "overlaps");
}

#[tokio::test]
async fn delete_booking_enforces_ownership() {
    let t = test_app();
    let (_, body) = create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;
    let id = body["booking"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &t.app,
        "DELETE",
        &format!("/api/bookings/{id}"),
        Some("bob-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied");

    let (status, body) = send(
        &t.app,
        "DELETE",
        &format!("/api/bookings/{id}"),
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedBooking"]["owner"], "alice");
    assert_eq!(body["deletedBooking"]["deletedBy"], "alice");

    let (status, _) = send(
        &t.app,
        "DELETE",
        &format!("/api/bookings/{id}"),
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admins_and_owners_may_delete_any_booking() {
    let t = test_app();
    for (creator, deleter) in [("alice-token", "admin-token"), ("bob-token", "owner-token")] {
        let (_, body) = create_booking(
            &t.app,
            creator,
            "2030-03-15T10:00:00Z",
            "2030-03-15T11:00:00Z",
        )
        .await;
        let id = body["booking"]["id"].as_str().unwrap().to_string();
        let (status, _) = send(
            &t.app,
            "DELETE",
            &format!("/api/bookings/{id}"),
            Some(deleter),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn list_bookings_filters_and_paginates() {
    let t = test_app();
    create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;
    create_booking(
        &t.app,
        "bob-token",
        "2030-03-15T12:00:00Z",
        "2030-03-15T13:00:00Z",
    )
    .await;
    create_booking(
        &t.app,
        "alice-token",
        "2030-03-16T10:00:00Z",
        "2030-03-16T11:00:00Z",
    )
    .await;

    let (status, body) = send(
        &t.app,
        "GET",
        "/api/bookings?limit=2",
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["bookings"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["remaining"], 1);
    // newest start first
    assert_eq!(
        body["bookings"][0]["startTime"],
        "2030-03-16T10:00:00Z"
    );

    let (_, body) = send(
        &t.app,
        "GET",
        &format!("/api/bookings?userId={}", t.bob.id),
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["bookings"][0]["userName"], "bob");

    let (_, body) = send(
        &t.app,
        "GET",
        "/api/bookings?startDate=2030-03-16T00:00:00Z",
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn usage_summary_requires_elevated_role() {
    let t = test_app();
    create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;

    let (status, _) = send(
        &t.app,
        "GET",
        "/api/bookings/usage-summary",
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &t.app,
        "GET",
        "/api/bookings/usage-summary",
        Some("owner-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["period"], "all");
    assert_eq!(body["summary"]["totalBookings"], 1);
    assert_eq!(body["summary"]["activeUsers"], 1);
    let top = &body["summary"]["users"][0];
    assert_eq!(top["userName"], "alice");
    assert_eq!(top["totalMinutes"], 60);
    assert_eq!(top["totalHours"], "1.0");
}

#[tokio::test]
async fn grouped_by_user_lists_every_active_user() {
    let t = test_app();
    create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;

    let (status, body) = send(
        &t.app,
        "GET",
        "/api/bookings/grouped-by-user",
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalUsers"], 4);
    assert_eq!(body["usersWithBookings"], 1);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let t = test_app();

    let (status, _) = send(&t.app, "GET", "/api/users", Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&t.app, "GET", "/api/users", Some("admin-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert_eq!(body["pagination"]["totalUsers"], 4);

    let (status, body) = send(
        &t.app,
        "GET",
        "/api/users?page=0",
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "page must be a positive integer");
}

#[tokio::test]
async fn create_user_validates_input() {
    let t = test_app();

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/users",
        Some("admin-token"),
        Some(json!({ "name": "carol", "email": "carol@example.com", "role": "user" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "carol");
    assert_eq!(body["role"], "user");

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/users",
        Some("admin-token"),
        Some(json!({ "name": "carol2", "email": "carol@example.com", "role": "user" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already in use");

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/users",
        Some("admin-token"),
        Some(json!({ "name": "dave", "role": "root" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid role. Must be admin, owner, or user");

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/users",
        Some("admin-token"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["name"], "Name is required");
    assert_eq!(body["details"]["role"], "Role is required");
}

#[tokio::test]
async fn profiles_are_visible_to_self_and_admin_only() {
    let t = test_app();
    let alice_id = t.alice.id;

    let (status, body) = send(
        &t.app,
        "GET",
        &format!("/api/users/{alice_id}"),
        Some("alice-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "alice");

    let (status, _) = send(
        &t.app,
        "GET",
        &format!("/api/users/{alice_id}"),
        Some("bob-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &t.app,
        "GET",
        &format!("/api/users/{alice_id}"),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn me_returns_profile_with_booking_stats() {
    let t = test_app();
    create_booking(
        &t.app,
        "alice-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;

    let (status, body) = send(&t.app, "GET", "/api/users/me", Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "alice");
    assert_eq!(body["stats"]["totalBookings"], 1);
    assert_eq!(body["stats"]["upcomingBookings"], 1);
}

#[tokio::test]
async fn role_updates_require_a_role_field() {
    let t = test_app();
    let alice_id = t.alice.id;

    let (status, body) = send(
        &t.app,
        "PUT",
        &format!("/api/users/{alice_id}"),
        Some("admin-token"),
        Some(json!({ "role": "owner" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "owner");

    let (status, body) = send(
        &t.app,
        "PUT",
        &format!("/api/users/{alice_id}"),
        Some("admin-token"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no fields to update");
}

#[tokio::test]
async fn soft_delete_restore_and_hard_delete() {
    let t = test_app();
    let alice_id = t.alice.id;
    let bob_id = t.bob.id;
    let admin_id = t.admin.id;

    // admins cannot remove their own account
    let (status, _) = send(
        &t.app,
        "DELETE",
        &format!("/api/users/{admin_id}"),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &t.app,
        "DELETE",
        &format!("/api/users/{alice_id}"),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // a deactivated account may not use its profile
    let (status, body) = send(&t.app, "GET", "/api/users/me", Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["details"].as_str().unwrap().contains("deactivated"));

    // deleting again is a 404 (already gone)
    let (status, _) = send(
        &t.app,
        "DELETE",
        &format!("/api/users/{alice_id}"),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &t.app,
        "PATCH",
        &format!("/api/users/{alice_id}/restore"),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isDeleted"], false);

    // hard delete removes the user and their bookings
    create_booking(
        &t.app,
        "bob-token",
        "2030-03-15T10:00:00Z",
        "2030-03-15T11:00:00Z",
    )
    .await;
    let (status, _) = send(
        &t.app,
        "DELETE",
        &format!("/api/users/{bob_id}/hard-delete"),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(t.store.bookings_of(bob_id).is_empty());
}

#[tokio::test]
async fn concurrent_overlapping_creates_allow_exactly_one() {
    let t = test_app();
    let (first, second) = tokio::join!(
        create_booking(
            &t.app,
            "alice-token",
            "2030-03-15T10:00:00Z",
            "2030-03-15T11:00:00Z",
        ),
        create_booking(
            &t.app,
            "bob-token",
            "2030-03-15T10:30:00Z",
            "2030-03-15T11:30:00Z",
        ),
    );

    let statuses = [first.0, second.0];
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::CREATED)
            .count(),
        1
    );
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::CONFLICT)
            .count(),
        1
    );
}
