use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use roster_core::{Roster, RosterError};
use roster_types::api::{
    DelFieldsRequest, GroupUpdate, GroupsFilter, NewGroupMember, NewGroupRequest, SetFieldsRequest,
};
use roster_types::models::{Group, MemberType, Session, User};

use crate::ListParams;
use crate::auth::{AppState, blocking};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct FieldsQuery {
    #[serde(default)]
    pub include_parent_fields: bool,
}

/// Lists groups of the caller's account; the system administrator may
/// list across accounts.
pub async fn list_groups(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(mut filter): Query<GroupsFilter>,
    Query(list): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    if !session.user.is_system_admin() {
        filter.account_id = Some(session.user.account.id);
    }
    let groups = blocking(&state, move |roster| {
        roster.get_groups(&filter, &list.sort, list.limit)
    })
    .await?;
    Ok(Json(groups))
}

pub async fn add_group(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<NewGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let group = blocking(&state, move |roster| roster.add_group(&session.user, &req)).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// Another account's group looks the same as a missing one, except to the
/// system administrator.
fn visible_group(roster: &Roster, user: &User, group_id: Uuid) -> roster_core::Result<Group> {
    let group = roster.get_group(group_id)?;
    if group.account.id != user.account.id && !user.is_system_admin() {
        return Err(RosterError::NotFound {
            entity: "group",
            id: group_id.to_string(),
        });
    }
    Ok(group)
}

pub async fn get_group(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let group = blocking(&state, move |roster| {
        visible_group(roster, &session.user, group_id)
    })
    .await?;
    Ok(Json(group))
}

pub async fn update_group(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
    Json(update): Json<GroupUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let group = blocking(&state, move |roster| {
        roster.upd_group(&session.user, group_id, &update)
    })
    .await?;
    Ok(Json(group))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |roster| roster.del_group(&session.user, group_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_fields(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<FieldsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = blocking(&state, move |roster| {
        visible_group(roster, &session.user, group_id)?;
        roster.get_group_fields(group_id, query.include_parent_fields)
    })
    .await?;
    Ok(Json(fields))
}

pub async fn set_fields(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<SetFieldsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |roster| {
        roster.set_group_fields(&session.user, group_id, &req.fields)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_fields(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<DelFieldsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |roster| {
        roster.del_group_fields(&session.user, group_id, &req.names)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
    Query(list): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let members = blocking(&state, move |roster| {
        roster.get_group_members(&session.user, group_id, list.limit)
    })
    .await?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<NewGroupMember>,
) -> Result<impl IntoResponse, ApiError> {
    let member = blocking(&state, move |roster| {
        roster.add_group_member(&session.user, group_id, req.member_type, req.member_id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn delete_member(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((group_id, member_type, member_id)): Path<(Uuid, MemberType, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |roster| {
        roster.del_group_member(&session.user, group_id, member_type, member_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
