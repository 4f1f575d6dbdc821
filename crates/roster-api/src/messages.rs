use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use roster_types::api::{MarkReadRequest, SendMessageRequest, SendMessageResponse};
use roster_types::models::Session;

use crate::auth::{AppState, blocking};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    /// `read`, `unread`, or empty for both.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub limit: u32,
}

pub async fn inbox(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<InboxQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session.user.id;
    let messages = blocking(&state, move |roster| {
        roster.inbox(user_id, &query.status, query.limit)
    })
    .await?;
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let from = session.user.id;
    let message_id = blocking(&state, move |roster| {
        roster.send_message(from, req.to_user_id, &req.message)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(SendMessageResponse { message_id })))
}

pub async fn get_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(&state, move |roster| roster.get_message(&session.user, message_id)).await?;
    Ok(Json(message))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(message_id): Path<Uuid>,
    Json(req): Json<MarkReadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(&state, move |roster| {
        roster.mark_read(&session.user, message_id, req.read)
    })
    .await?;
    Ok(Json(message))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |roster| roster.del_message(&session.user, message_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
