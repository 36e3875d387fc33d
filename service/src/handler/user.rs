use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use abi::{CreateUser, Role, UserListQuery};

use crate::auth::AuthorizedUser;
use crate::model::{
    CreateUserRequest, ListUsersParams, ListUsersResponse, MessageResponse, ProfileResponse,
    UpdateUserRequest, UserBody,
};
use crate::{ApiError, AppState};

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    user.require_admin()?;
    let role = match params.role.as_deref() {
        Some(raw) => Some(raw.parse::<Role>()?),
        None => None,
    };
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);
    let result = state
        .users
        .list(UserListQuery {
            page,
            limit,
            sort_by: params.sort_by,
            sort_order: params.sort_order,
            role,
            search: params.search,
            include_deleted: params.include_deleted.unwrap_or(false),
        })
        .await?;
    Ok(Json(ListUsersResponse::new(result, page, limit)))
}

pub async fn create_user(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    let created = state
        .users
        .create(CreateUser {
            name: req.name,
            email: req.email,
            role: req.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(UserBody::from(created))))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthorizedUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.users.profile(user.principal.user_id).await?;
    Ok(Json(profile.into()))
}

pub async fn get_user(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserBody>, ApiError> {
    user.require_self_or_admin(id)?;
    let found = state.users.get(id).await?;
    Ok(Json(found.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserBody>, ApiError> {
    user.require_admin()?;
    let Some(role_raw) = req.role else {
        return Err(abi::Error::InvalidQuery("no fields to update".into()).into());
    };
    let updated = state.users.update_role(id, role_raw.parse()?).await?;
    Ok(Json(updated.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_admin()?;
    if user.principal.user_id == id {
        return Err(abi::Error::InvalidQuery("cannot delete your own account".into()).into());
    }
    state.users.soft_delete(id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}

pub async fn restore_user(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserBody>, ApiError> {
    user.require_admin()?;
    let restored = state.users.restore(id).await?;
    Ok(Json(restored.into()))
}

pub async fn hard_delete_user(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_admin()?;
    state.users.hard_delete(id).await?;
    Ok(Json(MessageResponse {
        message: "User permanently deleted",
    }))
}
