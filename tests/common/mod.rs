//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

use bugbounty::config::Config;
use bugbounty::{create_app, Application};

pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Build an application on a private in-memory database
pub async fn create_test_app() -> Application {
    create_app(Config::testing())
        .await
        .expect("Failed to create test app")
}

/// Send one request through the trailing-slash-normalized service
pub async fn send(app: &Application, request: Request<Body>) -> Response {
    app.service().oneshot(request).await.unwrap()
}

pub async fn get(app: &Application, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    into_json(send(app, request).await).await
}

pub async fn post_json(app: &Application, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, &body.to_string()).await
}

pub async fn post_raw(app: &Application, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    into_json(send(app, request).await).await
}

pub async fn delete(app: &Application, uri: &str) -> StatusCode {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await.status()
}

/// Collect a response body as JSON; an empty body becomes `Value::Null`
pub async fn into_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Register a user through the API and return its id
pub async fn register_user(app: &Application, username: &str) -> i64 {
    let (status, body) = post_json(
        app,
        "/users",
        serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "correct-horse"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body["id"].as_i64().unwrap()
}

/// Create a program through the API and return its id
pub async fn create_program(app: &Application, name: &str, owner_id: i64) -> i64 {
    let (status, body) = post_json(
        app,
        "/programs",
        serde_json::json!({
            "name": name,
            "description": "Find bugs, get paid",
            "reward_min": 100,
            "reward_max": 5000,
            "owner_id": owner_id
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create program failed: {}", body);
    body["id"].as_i64().unwrap()
}
