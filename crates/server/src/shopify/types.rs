//! Wire types for the Admin API surfaces this service touches.

use serde::{Deserialize, Serialize};

/// A customer as returned by the REST Admin API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCustomer {
    /// Numeric Shopify customer id.
    pub id: i64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Comma-separated tag string, exactly as Shopify stores it.
    #[serde(default)]
    pub tags: String,
}

/// REST envelope: `{"customer": {...}}`.
#[derive(Debug, Deserialize)]
pub(super) struct CustomerEnvelope {
    pub customer: RemoteCustomer,
}

/// REST envelope: `{"customers": [...]}`.
#[derive(Debug, Deserialize)]
pub(super) struct CustomersEnvelope {
    pub customers: Vec<RemoteCustomer>,
}

/// Outbound customer payload for create/update.
#[derive(Debug, Serialize)]
pub(super) struct CustomerPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a str>,
}
