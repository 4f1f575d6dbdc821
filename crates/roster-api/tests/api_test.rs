use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use roster_api::{AppStateInner, router};
use roster_core::{Roster, RosterConfig};
use roster_db::Database;

const ADMIN_PASSWORD: &str = "s3cret-admin";

fn app() -> Router {
    let roster = Roster::new(Database::open_in_memory().unwrap(), RosterConfig::default());
    roster.bootstrap_system_admin("admin", ADMIN_PASSWORD).unwrap();
    router(Arc::new(AppStateInner { roster }))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-Auth-Token", token);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

/// Creates an account through the API and returns its admin's token.
async fn tenant(app: &Router, admin_token: &str, name: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/accounts",
        Some(admin_token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let username = body["admin_user"]["username"].as_str().unwrap().to_string();
    let password = body["admin_password"].as_str().unwrap().to_string();
    login(app, &username, &password).await
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = call(&app, Method::GET, "/users", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_logout_cycle() {
    let app = app();
    let (status, _) = call(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "admin", ADMIN_PASSWORD).await;
    let (status, body) = call(&app, Method::GET, "/account", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "system");

    let (status, _) = call(&app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::GET, "/account", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn error_kinds_map_to_statuses() {
    let app = app();
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let acme = tenant(&app, &admin, "acme").await;

    // validation
    let (status, _) = call(
        &app,
        Method::POST,
        "/groups",
        Some(&acme),
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // not authorized
    let (status, _) = call(
        &app,
        Method::POST,
        "/accounts",
        Some(&acme),
        Some(json!({ "name": "sneaky" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // not found
    let (status, _) = call(
        &app,
        Method::GET,
        "/group/6f1c1f4e-8a57-4a53-9d0e-3f7f3c2e9b11",
        Some(&acme),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // conflict
    let (status, _) = call(
        &app,
        Method::POST,
        "/accounts",
        Some(&admin),
        Some(json!({ "name": "acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    // sorting on an unknown key
    let (status, _) = call(&app, Method::GET, "/users?sort=password", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn groups_and_members_over_http() {
    let app = app();
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let acme = tenant(&app, &admin, "acme").await;

    let (status, group) = call(
        &app,
        Method::POST,
        "/groups",
        Some(&acme),
        Some(json!({ "name": "Team", "data": { "colour": "blue" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{group}");
    let group_id = group["id"].as_str().unwrap().to_string();
    assert_eq!(group["data"]["colour"], "blue");

    let (status, user) = call(
        &app,
        Method::POST,
        "/users",
        Some(&acme),
        Some(json!({ "username": "jan", "password": "jan-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    let user_id = user["id"].as_str().unwrap().to_string();

    let (status, member) = call(
        &app,
        Method::POST,
        &format!("/group/{group_id}/members"),
        Some(&acme),
        Some(json!({ "member_type": "user", "member_id": user_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{member}");

    let (status, members) = call(
        &app,
        Method::GET,
        &format!("/group/{group_id}/members"),
        Some(&acme),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 1);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/group/{group_id}/member/user/{user_id}"),
        Some(&acme),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/group/{group_id}"),
        Some(&acme),
        Some(json!({ "name": "Renamed", "data": { "colour": null, "size": "L" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["data"], json!({ "size": "L" }));

    // another tenant cannot see it
    let other = tenant(&app, &admin, "other").await;
    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/group/{group_id}"),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/group/{group_id}/fields?include_parent_fields=true"),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, fields) = call(
        &app,
        Method::GET,
        &format!("/group/{group_id}/fields"),
        Some(&acme),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(fields.as_array().unwrap().is_empty());
    let (status, listed) = call(&app, Method::GET, "/groups", Some(&other), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/group/{group_id}"),
        Some(&acme),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // nothing left to delete
    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/group/{group_id}"),
        Some(&acme),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn registration_and_messages_over_http() {
    let app = app();
    let (status, countries) = call(&app, Method::GET, "/countries?name=south", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(countries[0]["id"], "ZA");

    let (status, registered) = call(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({
            "email": "thandi@example.com",
            "phone": "+27 82 555 0100",
            "name": "Thandi",
            "surname": "Mokoena",
            "dob": "1990-04-27",
            "gender": "female",
            "country_id": "ZA",
            "national_id": "9004270000000",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{registered}");

    let (status, user) = call(
        &app,
        Method::POST,
        "/activate",
        None,
        Some(json!({
            "email": "thandi@example.com",
            "token": registered["token"],
            "new_password": "my-own-password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{user}");
    let thandi_id = user["id"].as_str().unwrap().to_string();
    let thandi = login(&app, "thandi@example.com", "my-own-password").await;

    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let (status, sent) = call(
        &app,
        Method::POST,
        "/messages",
        Some(&admin),
        Some(json!({ "to_user_id": thandi_id, "message": "welcome" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = sent["message_id"].as_str().unwrap().to_string();

    let (status, inbox) = call(&app, Method::GET, "/messages?status=unread", Some(&thandi), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox[0]["message"], "welcome");

    let (status, read) = call(
        &app,
        Method::PUT,
        &format!("/message/{message_id}"),
        Some(&thandi),
        Some(json!({ "read": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(read["time_read"].is_string());

    let (status, inbox) = call(&app, Method::GET, "/messages?status=unread", Some(&thandi), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(inbox.as_array().unwrap().is_empty());

    let (status, _) = call(&app, Method::GET, "/messages?status=starred", Some(&thandi), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // persons are for the system administrator
    let (status, _) = call(&app, Method::GET, "/persons", Some(&thandi), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, persons) = call(&app, Method::GET, "/persons?surname=moko", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(persons.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn tenant_admin_creates_a_user() {
    let app = app();
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let test1 = tenant(&app, &admin, "test1").await;

    let (status, user) = call(
        &app,
        Method::POST,
        "/users",
        Some(&test1),
        Some(json!({ "username": "one", "password": "one" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    assert_eq!(user["account"]["name"], "test1");
    let one = login(&app, "one", "one").await;

    // a plain user cannot create users, nor can the system administrator
    for token in [&one, &admin] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/users",
            Some(token),
            Some(json!({ "username": "two", "password": "two" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, users) = call(&app, Method::GET, "/users?sort=username", Some(&test1), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["one", "test1.admin"]);

    let (status, _) = call(&app, Method::POST, "/logout", Some(&test1), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::GET, "/users", Some(&test1), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
