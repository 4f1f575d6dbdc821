use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use roster_core::access::require_system_admin;
use roster_types::api::PersonsFilter;
use roster_types::models::Session;

use crate::ListParams;
use crate::auth::{AppState, blocking};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct CountriesQuery {
    #[serde(default)]
    pub name: String,
}

pub async fn list_persons(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(filter): Query<PersonsFilter>,
    Query(list): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    require_system_admin(&session.user)?;
    let persons = blocking(&state, move |roster| {
        roster.get_persons(&filter, &list.sort, list.limit)
    })
    .await?;
    Ok(Json(persons))
}

pub async fn get_person(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(person_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_system_admin(&session.user)?;
    let person = blocking(&state, move |roster| roster.get_person(person_id)).await?;
    Ok(Json(person))
}

/// Public, so that the registration form can offer the list.
pub async fn list_countries(
    State(state): State<AppState>,
    Query(query): Query<CountriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let countries = blocking(&state, move |roster| roster.get_countries(&query.name)).await?;
    Ok(Json(countries))
}
