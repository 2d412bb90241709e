//! Integration tests for the App Proxy eligibility endpoint.
//!
//! These tests require:
//! - The server running (cargo run -p tier-discounts-server)
//! - `SHOPIFY_API_SECRET` in the environment matching the server's secret
//!
//! Run with: cargo test -p tier-discounts-integration-tests -- --ignored

use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn api_secret() -> String {
    std::env::var("SHOPIFY_API_SECRET").expect("SHOPIFY_API_SECRET must be set")
}

/// Sign a query string the way Shopify's App Proxy does: drop `signature`,
/// sort `key=value` pairs, concatenate without separators, HMAC-SHA256.
fn sign(pairs: &[(&str, &str)]) -> String {
    let mut rendered: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
    rendered.sort();
    let message = rendered.concat();

    let mut mac = HmacSha256::new_from_slice(api_secret().as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Build a signed proxy URL from query pairs.
fn signed_url(pairs: &[(&str, &str)]) -> String {
    let signature = sign(pairs);
    let query: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .chain(std::iter::once(format!("signature={signature}")))
        .collect();
    format!("{}/apps/proxy/discount?{}", base_url(), query.join("&"))
}

#[tokio::test]
#[ignore = "Requires running server and Shopify credentials"]
async fn test_unsigned_request_rejected() {
    let client = Client::new();

    let resp = client
        .get(format!("{}/apps/proxy/discount?product_id=1", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and Shopify credentials"]
async fn test_tampered_signature_rejected() {
    let client = Client::new();

    let url = format!(
        "{}/apps/proxy/discount?product_id=1&signature={}",
        base_url(),
        "0".repeat(64)
    );
    let resp = client.get(url).send().await.expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and Shopify credentials"]
async fn test_missing_product_id_rejected() {
    let client = Client::new();

    let url = signed_url(&[("customer_id", "123")]);
    let resp = client.get(url).send().await.expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and Shopify credentials"]
async fn test_unknown_customer_gets_no_discount() {
    let client = Client::new();

    let url = signed_url(&[("product_id", "1"), ("customer_id", "999999999999")]);
    let resp = client.get(url).send().await.expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["eligible"], false);
    assert_eq!(body["percent"], 0.0);
}

#[tokio::test]
#[ignore = "Requires running server and Shopify credentials"]
async fn test_missing_customer_id_rejected() {
    let client = Client::new();

    let url = signed_url(&[("product_id", "1")]);
    let resp = client.get(url).send().await.expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
