use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use roster_core::Roster;
use roster_types::api::{ActivateRequest, LoginRequest, RegisterRequest};
use roster_types::models::Session;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub roster: Roster,
}

/// Runs a core operation on the blocking pool; the database calls are
/// synchronous.
pub(crate) async fn blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&Roster) -> roster_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    Ok(tokio::task::spawn_blocking(move || op(&state.roster)).await??)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registered = blocking(&state, move |roster| roster.register(&req)).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

pub async fn activate(
    State(state): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |roster| roster.activate_user(&req)).await?;
    Ok(Json(user))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = blocking(&state, move |roster| roster.login(&req.username, &req.password)).await?;
    Ok(Json(session))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |roster| roster.logout(&session.token)).await?;
    Ok(StatusCode::NO_CONTENT)
}
