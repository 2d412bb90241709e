//! Shopify Admin API client.
//!
//! # Architecture
//!
//! - REST for customer CRUD (`customers/{id}.json`, `customers/search.json`)
//! - Raw GraphQL documents with `serde_json` variables for segments,
//!   automatic discounts, and collection membership (the mutations are
//!   composed per customer, so generated query types buy nothing here)
//! - Offline access token loaded from the `sessions` table or environment
//! - Rate limiting surfaced as `ShopifyError::RateLimited`

pub mod client;
pub mod collections;
pub mod customers;
pub mod discounts;
pub mod segments;
pub mod types;

pub use client::AdminClient;
pub use collections::CollectionRef;
pub use discounts::DiscountInput;
pub use types::RemoteCustomer;

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// No offline access token is stored for the shop.
    #[error("No session for shop {0}")]
    NoSession(String),

    /// Unexpected HTTP status from a REST endpoint.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}
