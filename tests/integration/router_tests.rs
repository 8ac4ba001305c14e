//! In-process router tests against the in-memory store

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use lendly::{
    api,
    config::{AppConfig, StorageBackend},
    repository::Repository,
    services::Services,
    AppState,
};

async fn app() -> Router {
    let mut config = AppConfig::default();
    config.storage.backend = StorageBackend::Memory;

    let services = Services::new(Repository::in_memory())
        .await
        .expect("Failed to create services");

    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn send(app: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", path));

    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Failed to send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_borrow_return_scenario() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/members",
        Some(json!({ "name": "Ada", "email": "ada@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "X", "author": "A", "category": "C", "total_copies": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["available_copies"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/borrow",
        Some(json!({ "member_id": 1, "book_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["return_date"].is_null());

    let (_, body) = send(&app, Method::GET, "/books/1", None).await;
    assert_eq!(body["data"]["available_copies"], 0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/borrow",
        Some(json!({ "member_id": 1, "book_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Conflict");

    let (status, _) = send(&app, Method::DELETE, "/books/1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::GET, "/books/borrowed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = send(&app, Method::GET, "/members/1/borrowed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["book_id"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/return",
        Some(json!({ "member_id": 1, "book_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["return_date"].is_string());

    let (_, body) = send(&app, Method::GET, "/books/1", None).await;
    assert_eq!(body["data"]["available_copies"], 1);

    let (status, _) = send(
        &app,
        Method::POST,
        "/return",
        Some(json!({ "member_id": 1, "book_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, "/books/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book deleted successfully");
}

#[tokio::test]
async fn test_unavailable_maps_to_unprocessable() {
    let app = app().await;
    for (name, email) in [("Ada", "ada@x.com"), ("Grace", "grace@x.com")] {
        send(&app, Method::POST, "/members", Some(json!({ "name": name, "email": email }))).await;
    }
    send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "X", "author": "A", "category": "C", "total_copies": 1 })),
    )
    .await;

    send(&app, Method::POST, "/borrow", Some(json!({ "member_id": 1, "book_id": 1 }))).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/borrow",
        Some(json!({ "member_id": 2, "book_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Unavailable");
}

#[tokio::test]
async fn test_update_with_shrink_clamps() {
    let app = app().await;
    send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "X", "author": "A", "category": "C", "total_copies": 5 })),
    )
    .await;
    for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
        send(
            &app,
            Method::POST,
            "/members",
            Some(json!({ "name": name, "email": format!("{}@x.com", name) })),
        )
        .await;
        send(&app, Method::POST, "/borrow", Some(json!({ "member_id": id, "book_id": 1 }))).await;
    }

    let (status, body) = send(
        &app,
        Method::PUT,
        "/books/1",
        Some(json!({ "title": "X", "author": "A", "category": "C", "total_copies": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_copies"], 2);
    assert_eq!(body["data"]["available_copies"], 0);
}

#[tokio::test]
async fn test_validation_errors() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "", "author": "A", "category": "C", "total_copies": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, _) = send(
        &app,
        Method::POST,
        "/members",
        Some(json!({ "name": "Ada", "email": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/borrow",
        Some(json!({ "member_id": "one", "book_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicates() {
    let app = app().await;

    let member = json!({ "id": 4, "name": "Ada", "email": "ada@x.com" });
    let (status, _) = send(&app, Method::POST, "/members", Some(member.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/members", Some(member)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DuplicateContact");

    let (status, body) = send(
        &app,
        Method::POST,
        "/members",
        Some(json!({ "id": 4, "name": "Grace", "email": "grace@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DuplicateIdentifier");

    let (_, body) = send(
        &app,
        Method::POST,
        "/members",
        Some(json!({ "name": "Alan", "email": "alan@x.com" })),
    )
    .await;
    assert_eq!(body["data"]["id"], 5);
}

#[tokio::test]
async fn test_lists_and_not_found() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    let (status, body) = send(&app, Method::GET, "/overdue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, Method::GET, "/members/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");

    let (status, _) = send(&app, Method::GET, "/members/9/borrowed", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/books/9",
        Some(json!({ "title": "X", "author": "A", "category": "C", "total_copies": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_path_id_uses_error_envelope() {
    let app = app().await;

    for (method, path) in [
        (Method::GET, "/books/abc"),
        (Method::DELETE, "/books/abc"),
        (Method::GET, "/members/abc"),
        (Method::GET, "/members/abc/borrowed"),
    ] {
        let (status, body) = send(&app, method, path, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(body["success"], false, "{}", path);
        assert_eq!(body["error"], "BadValue", "{}", path);
    }
}
