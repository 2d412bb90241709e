//! Integration tests for customer CRUD and the discount route.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The server running (cargo run -p tier-discounts-server)
//! - Valid Shopify credentials in environment
//!
//! Run with: cargo test -p tier-discounts-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Base URL for the API (configurable via environment).
fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// Test helper: create a customer and return its JSON body.
async fn create_test_customer(client: &Client, email: &str) -> Value {
    let resp = client
        .post(format!("{}/customers", base_url()))
        .json(&json!({
            "email": email,
            "first_name": "Test",
            "last_name": "Customer",
        }))
        .send()
        .await
        .expect("Failed to create test customer");

    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse customer")
}

/// Test helper: delete a customer, ignoring failures.
async fn delete_test_customer(client: &Client, customer_id: i64) {
    let _ = client
        .post(format!("{}/customers/{customer_id}/delete", base_url()))
        .send()
        .await;
}

#[tokio::test]
#[ignore = "Requires running server and Shopify credentials"]
async fn test_customer_lifecycle() {
    let client = client();
    let email = format!("it-{}@example.com", std::process::id());

    let customer = create_test_customer(&client, &email).await;
    let id = customer["id"].as_i64().expect("customer id");
    assert_eq!(customer["email"], email.as_str());

    // Show includes the details array
    let resp = client
        .get(format!("{}/customers/{id}", base_url()))
        .send()
        .await
        .expect("Failed to get customer");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert!(body["details"].is_array());

    // Update the profile
    let resp = client
        .post(format!("{}/customers/{id}", base_url()))
        .json(&json!({
            "email": email,
            "first_name": "Renamed",
            "last_name": "Customer",
        }))
        .send()
        .await
        .expect("Failed to update customer");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["first_name"], "Renamed");

    delete_test_customer(&client, id).await;

    let resp = client
        .get(format!("{}/customers/{id}", base_url()))
        .send()
        .await
        .expect("Failed to get customer");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and Shopify credentials"]
async fn test_duplicate_email_rejected() {
    let client = client();
    let email = format!("it-dup-{}@example.com", std::process::id());

    let customer = create_test_customer(&client, &email).await;
    let id = customer["id"].as_i64().expect("customer id");

    let resp = client
        .post(format!("{}/customers", base_url()))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    delete_test_customer(&client, id).await;
}

#[tokio::test]
#[ignore = "Requires running server and Shopify credentials"]
async fn test_customer_details_lifecycle() {
    let client = client();
    let email = format!("it-detail-{}@example.com", std::process::id());

    let customer = create_test_customer(&client, &email).await;
    let id = customer["id"].as_i64().expect("customer id");

    let resp = client
        .post(format!("{}/customers/{id}/details", base_url()))
        .json(&json!({ "title": "Preferences", "body": "Ships to warehouse" }))
        .send()
        .await
        .expect("Failed to create detail");
    assert_eq!(resp.status(), StatusCode::OK);
    let detail: Value = resp.json().await.expect("Failed to parse detail");
    let detail_id = detail["id"].as_i64().expect("detail id");

    let resp = client
        .post(format!("{}/details/{detail_id}", base_url()))
        .json(&json!({ "title": "Preferences", "body": "Ships to storefront" }))
        .send()
        .await
        .expect("Failed to update detail");
    assert_eq!(resp.status(), StatusCode::OK);
    let detail: Value = resp.json().await.expect("Failed to parse detail");
    assert_eq!(detail["body"], "Ships to storefront");

    let resp = client
        .post(format!("{}/details/{detail_id}/delete", base_url()))
        .send()
        .await
        .expect("Failed to delete detail");
    assert_eq!(resp.status(), StatusCode::OK);

    delete_test_customer(&client, id).await;
}

#[tokio::test]
#[ignore = "Requires running server and Shopify credentials"]
async fn test_sync_reports_counts() {
    let client = client();

    let resp = client
        .post(format!("{}/sync/customers", base_url()))
        .send()
        .await
        .expect("Failed to trigger sync");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse body");
    assert!(body["synced"].is_u64());
    assert!(body["skipped"].is_u64());
}
