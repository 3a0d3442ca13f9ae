//! Error handler integration tests
//!
//! Pins the response bodies clients depend on: the not-found message and
//! the validation envelope.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

mod common;
use common::{create_test_app, get, into_json, post_json, post_raw, register_user, send};

#[tokio::test]
async fn test_unknown_path_returns_api_not_found() {
    let app = create_test_app().await;

    for uri in ["/", "/nope", "/users/1/extra", "/programs/1/deep/path"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, json!({ "message": "API not found" }), "{}", uri);
    }
}

#[tokio::test]
async fn test_missing_fields_return_validation_body() {
    let app = create_test_app().await;

    let (status, body) = post_json(&app, "/users", json!({ "username": "alice" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "message": "wrong or missing request property",
            "fields": {
                "json": {
                    "email": ["Missing data for required field."],
                    "password": ["Missing data for required field."]
                }
            }
        })
    );
}

#[tokio::test]
async fn test_malformed_json_returns_validation_body() {
    let app = create_test_app().await;

    let (status, body) = post_raw(&app, "/programs", "{\"name\": ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "wrong or missing request property");
    assert!(body["fields"]["json"]["_schema"][0].is_string());
}

#[tokio::test]
async fn test_wrong_field_type_returns_validation_body() {
    let app = create_test_app().await;

    let (status, body) = post_json(
        &app,
        "/programs",
        json!({ "name": "Acme", "reward_min": "lots", "reward_max": 10, "owner_id": 1 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "wrong or missing request property");
    assert!(body["fields"]["json"]["_schema"].is_array());
}

#[tokio::test]
async fn test_missing_content_type_returns_validation_body() {
    let app = create_test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/users")
        .body(Body::from(r#"{"username": "alice"}"#))
        .unwrap();
    let (status, body) = into_json(send(&app, request).await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "wrong or missing request property");
}

#[tokio::test]
async fn test_domain_errors_use_their_own_status() {
    let app = create_test_app().await;

    let (status, body) = get(&app, "/programs/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Program 42 not found" }));

    register_user(&app, "alice").await;
    let (status, body) = post_json(
        &app,
        "/users",
        json!({ "username": "alice", "email": "other@example.com", "password": "password123" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "message": "Username 'alice' is already taken" }));
}

#[tokio::test]
async fn test_error_responses_are_json() {
    let app = create_test_app().await;

    let request = Request::builder().uri("/missing").body(Body::empty()).unwrap();
    let response = send(&app, request).await;

    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_non_numeric_id_returns_api_not_found() {
    let app = create_test_app().await;

    for uri in ["/programs/abc", "/users/abc", "/programs/1.5", "/users/-"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, json!({ "message": "API not found" }), "{}", uri);
    }

    let request = Request::builder()
        .method("DELETE")
        .uri("/programs/abc")
        .body(Body::empty())
        .unwrap();
    let (status, body) = into_json(send(&app, request).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "API not found" }));
}

#[tokio::test]
async fn test_wrong_method_returns_json_body() {
    let app = create_test_app().await;

    let request = Request::builder()
        .method("PUT")
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = send(&app, request).await;

    assert!(response.headers().contains_key(header::ALLOW));
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let (status, body) = into_json(response).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "message": "Method not allowed" }));
}
