use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use abi::{BookingQuery, CreateBooking, GroupedQuery, SummaryPeriod};

use crate::auth::AuthorizedUser;
use crate::model::{
    CreateBookingRequest, CreateBookingResponse, DeleteBookingResponse, DeletedBookingBody,
    GroupedParams, GroupedResponse, ListBookingsParams, ListBookingsResponse, SummaryParams,
    UsageSummaryResponse, parse_query_instant,
};
use crate::{ApiError, AppState};

pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .bookings
        .create(CreateBooking {
            user_id: user.principal.user_id,
            start_time: req.start_time,
            end_time: req.end_time,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            message: "Booking created successfully",
            booking: booking.into(),
        }),
    ))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteBookingResponse>, ApiError> {
    let deleted = state.bookings.delete(id, &user.principal).await?;
    Ok(Json(DeleteBookingResponse {
        message: "Booking deleted successfully",
        deleted_booking: DeletedBookingBody::new(deleted, user.principal.name),
    }))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    _user: AuthorizedUser,
    Query(params): Query<ListBookingsParams>,
) -> Result<Json<ListBookingsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(50);
    let offset = params.offset.unwrap_or(0);
    let query = BookingQuery {
        start_after: parse_query_instant("start_date", params.start_date.as_deref())?,
        end_before: parse_query_instant("end_date", params.end_date.as_deref())?,
        user_id: params.user_id,
        limit,
        offset,
    };
    let page = state.bookings.list(query).await?;
    Ok(Json(ListBookingsResponse::new(page, limit, offset)))
}

pub async fn usage_summary(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Query(params): Query<SummaryParams>,
) -> Result<Json<UsageSummaryResponse>, ApiError> {
    user.require_admin_or_owner()?;
    let period = SummaryPeriod::parse(params.period.as_deref());
    let summary = state.bookings.usage_summary(period).await?;
    Ok(Json(summary.into()))
}

pub async fn grouped_by_user(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Query(params): Query<GroupedParams>,
) -> Result<Json<GroupedResponse>, ApiError> {
    user.require_admin_or_owner()?;
    let query = GroupedQuery {
        start_after: parse_query_instant("start_date", params.start_date.as_deref())?,
        start_before: parse_query_instant("end_date", params.end_date.as_deref())?,
    };
    let groups = state.bookings.grouped_by_user(query).await?;
    Ok(Json(groups.into()))
}
