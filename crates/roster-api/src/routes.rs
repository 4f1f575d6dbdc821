use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::auth::{self, AppState};
use crate::middleware::require_session;
use crate::{accounts, groups, messages, persons, users};

/// All routes. Cross-cutting layers (CORS, tracing) are added by the
/// server.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/register", post(auth::register))
        .route("/activate", post(auth::activate))
        .route("/login", post(auth::login))
        .route("/countries", get(persons::list_countries))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/user/{user_id}", get(users::get_user))
        .route("/user/{user_id}/password", put(users::change_password))
        .route("/messages", get(messages::inbox).post(messages::send_message))
        .route(
            "/message/{message_id}",
            get(messages::get_message)
                .put(messages::mark_read)
                .delete(messages::delete_message),
        )
        .route("/accounts", get(accounts::list_accounts).post(accounts::add_account))
        .route("/account", get(accounts::own_account))
        .route(
            "/account/{account_id}",
            get(accounts::get_account).put(accounts::set_account_active),
        )
        .route("/groups", get(groups::list_groups).post(groups::add_group))
        .route(
            "/group/{group_id}",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route(
            "/group/{group_id}/fields",
            get(groups::get_fields)
                .put(groups::set_fields)
                .delete(groups::delete_fields),
        )
        .route(
            "/group/{group_id}/members",
            get(groups::list_members).post(groups::add_member),
        )
        .route(
            "/group/{group_id}/member/{member_type}/{member_id}",
            delete(groups::delete_member),
        )
        .route("/persons", get(persons::list_persons))
        .route("/person/{person_id}", get(persons::get_person))
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
