//! Customer and customer-detail models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tier_discounts_core::{
    CustomerDetailId, CustomerId, Email, Percentage, PercentageError, ShopifyCustomerId,
    TargetScope,
};

/// A locally mirrored customer with their desired discount state.
///
/// The local row is the source of truth for what the discount *should* be;
/// `shopify_discount_id` and `shopify_tags` cache what was last observed on
/// Shopify after a successful reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    /// Shopify customer id; `None` (or a stored 0) means unconfirmed.
    pub shopify_id: Option<ShopifyCustomerId>,
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Desired discount percentage, 0-100. At or below zero disables the
    /// discount everywhere.
    pub discount_percentage: f64,
    pub discount_target_type: String,
    pub discount_target_ids: Vec<String>,
    /// Remote automatic-discount gid from the last successful reconciliation.
    pub shopify_discount_id: Option<String>,
    /// Last-known remote tag string (audit cache, not authoritative).
    pub shopify_tags: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// The confirmed Shopify identity, if any. Stored zeros count as
    /// unconfirmed and are never sent to Shopify.
    #[must_use]
    pub fn confirmed_shopify_id(&self) -> Option<ShopifyCustomerId> {
        self.shopify_id.filter(ShopifyCustomerId::is_confirmed)
    }

    /// Display name assembled from first/last name, `None` when both are
    /// blank.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        (!joined.is_empty()).then_some(joined)
    }

    /// The stored discount scope, `None` if the stored target type is not
    /// recognized.
    #[must_use]
    pub fn discount_scope(&self) -> Option<TargetScope> {
        TargetScope::from_parts(&self.discount_target_type, self.discount_target_ids.clone())
    }

    /// The stored percentage as a validated value.
    ///
    /// # Errors
    ///
    /// Returns [`PercentageError`] if the stored value is out of range, which
    /// only happens if a row was written outside the validated paths.
    pub fn percentage(&self) -> Result<Percentage, PercentageError> {
        Percentage::new(self.discount_percentage)
    }
}

/// Input for creating a local customer row.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A free-form note attached to a customer.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    pub id: CustomerDetailId,
    pub customer_id: CustomerId,
    pub title: String,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
