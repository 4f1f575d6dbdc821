use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use roster_types::api::{ChangePasswordRequest, NewUserRequest, UsersFilter};
use roster_types::models::Session;

use crate::ListParams;
use crate::auth::{AppState, blocking};
use crate::error::ApiError;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(filter): Query<UsersFilter>,
    Query(list): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let users = blocking(&state, move |roster| {
        roster.get_users(&session.user, &filter, &list.sort, list.limit)
    })
    .await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<NewUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |roster| roster.create_account_user(&session.user, &req)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = (!session.user.is_system_admin()).then_some(session.user.account.id);
    let user = blocking(&state, move |roster| roster.get_user(scope, user_id)).await?;
    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |roster| {
        roster.change_password_as(&session.user, user_id, &req.new_password)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
