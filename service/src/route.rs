use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::handler::{booking, health, user};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    let bookings = Router::new()
        .route("/", post(booking::create_booking).get(booking::list_bookings))
        .route("/usage-summary", get(booking::usage_summary))
        .route("/grouped-by-user", get(booking::grouped_by_user))
        .route("/:id", delete(booking::delete_booking));

    let users = Router::new()
        .route("/", get(user::list_users).post(user::create_user))
        .route("/me", get(user::me))
        .route(
            "/:id",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route("/:id/restore", patch(user::restore_user))
        .route("/:id/hard-delete", delete(user::hard_delete_user));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/bookings", bookings)
        .nest("/api/users", users)
}
