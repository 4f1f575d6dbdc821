use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use roster_core::access::require_system_admin;
use roster_types::api::{AccountsFilter, NewAccountRequest, SetAccountActiveRequest};
use roster_types::models::Session;

use crate::ListParams;
use crate::auth::{AppState, blocking};
use crate::error::ApiError;

pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(filter): Query<AccountsFilter>,
    Query(list): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = blocking(&state, move |roster| {
        roster.get_accounts(&session.user, &filter, &list.sort, list.limit)
    })
    .await?;
    Ok(Json(accounts))
}

pub async fn add_account(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<NewAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = blocking(&state, move |roster| roster.add_account(&session.user, &req)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// The caller's own account.
pub async fn own_account(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let id = session.user.account.id;
    let account = blocking(&state, move |roster| roster.get_account(id)).await?;
    Ok(Json(account))
}

/// Other accounts are visible to the system administrator only.
pub async fn get_account(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if account_id != session.user.account.id {
        require_system_admin(&session.user)?;
    }
    let account = blocking(&state, move |roster| roster.get_account(account_id)).await?;
    Ok(Json(account))
}

pub async fn set_account_active(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(account_id): Path<Uuid>,
    Json(req): Json<SetAccountActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = blocking(&state, move |roster| {
        roster.set_account_active(&session.user, account_id, req.active)
    })
    .await?;
    Ok(Json(account))
}
