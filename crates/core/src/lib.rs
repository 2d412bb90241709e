//! Tier Discounts Core - Shared types library.
//!
//! Common domain types used by the server crate and the integration tests:
//! type-safe IDs, Shopify global-identifier helpers, the validated discount
//! percentage, and the discount target scope.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
