//! Live API tests against a running server

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:3000/api/v1";

/// Unique suffix so repeated runs do not collide on emails
fn unique() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"].is_array());
    assert!(body["count"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return() {
    let client = Client::new();

    let response = client
        .post(format!("{}/members", BASE_URL))
        .json(&json!({
            "name": "Test Member",
            "email": format!("member-{}@example.com", unique())
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let member_id = body["data"]["id"].as_i64().expect("No member ID");

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Test Book",
            "author": "Test Author",
            "category": "Testing",
            "total_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let book_id = body["data"]["id"].as_i64().expect("No book ID");

    let loan = json!({ "member_id": member_id, "book_id": book_id });

    let response = client
        .post(format!("{}/borrow", BASE_URL))
        .json(&loan)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/return", BASE_URL))
        .json(&loan)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    // Cleanup
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_get_unknown_member() {
    let client = Client::new();

    let response = client
        .get(format!("{}/members/{}", BASE_URL, i32::MAX))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}
