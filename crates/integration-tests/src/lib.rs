//! Integration tests for the tier-discounts backend.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! sqlx migrate run --source crates/server/migrations
//!
//! # Start the server
//! cargo run -p tier-discounts-server
//!
//! # Run the ignored tests
//! cargo test -p tier-discounts-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `customers` - Local CRUD and Shopify mirroring
//! - `discounts` - Reconciliation pipeline end to end
//! - `proxy` - App Proxy signature and eligibility
