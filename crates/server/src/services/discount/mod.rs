//! Per-customer automatic discount reconciliation.
//!
//! The local `customers` row is the desired state; this service drives
//! Shopify towards it in one idempotent pass: tags, then segment, then the
//! automatic discount. Every remote name is derived deterministically from
//! the local customer id, so re-running the pipeline converges on the same
//! objects instead of accumulating new ones.

pub mod tags;

use std::future::Future;

use thiserror::Error;

use tier_discounts_core::{CustomerId, Percentage, ShopifyCustomerId, TargetScope};

use crate::db::RepositoryError;
use crate::models::Customer;
use crate::shopify::{AdminClient, DiscountInput, ShopifyError};

pub use tags::synchronize_tags;

/// Errors from the reconciliation pipeline.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// The customer has no confirmed Shopify identity; nothing was sent.
    #[error("customer has no confirmed Shopify identity")]
    UnconfirmedIdentity,

    /// No offline access token is stored for the shop.
    #[error("no session for shop {0}")]
    NoSession(String),

    /// Shopify rejected the input (mutation `userErrors`).
    #[error("{0}")]
    Validation(String),

    /// Shopify call failed (transport or GraphQL).
    #[error("Shopify error: {0}")]
    Shopify(ShopifyError),

    /// Local store failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<ShopifyError> for DiscountError {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::UserError(msg) => Self::Validation(msg),
            ShopifyError::NoSession(shop) => Self::NoSession(shop),
            other => Self::Shopify(other),
        }
    }
}

/// What a successful reconciliation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountOutcome {
    /// Remote automatic-discount gid (authoritative; may differ from the
    /// stored one if the discount was recreated by title).
    pub discount_id: String,
    /// The tag string written to Shopify.
    pub tags: String,
}

/// The remote operations reconciliation needs.
///
/// `AdminClient` is the production implementation; tests substitute a fake
/// to exercise the pipeline without network access.
pub trait DiscountPlatform {
    /// Fetch the customer's current tag string.
    fn fetch_customer_tags(
        &self,
        id: ShopifyCustomerId,
    ) -> impl Future<Output = Result<String, ShopifyError>> + Send;

    /// Replace the customer's tag string.
    fn save_customer_tags(
        &self,
        id: ShopifyCustomerId,
        tags: &str,
    ) -> impl Future<Output = Result<(), ShopifyError>> + Send;

    /// Find a segment gid by exact name.
    fn find_segment(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, ShopifyError>> + Send;

    /// Create a segment, returning its gid.
    fn create_segment(
        &self,
        name: &str,
        query: &str,
    ) -> impl Future<Output = Result<String, ShopifyError>> + Send;

    /// Check whether a discount gid still resolves.
    fn get_discount_node(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<String>, ShopifyError>> + Send;

    /// Find an automatic basic discount gid by exact title.
    fn find_discount_by_title(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Option<String>, ShopifyError>> + Send;

    /// Create an automatic discount, returning the node gid.
    fn create_discount(
        &self,
        input: &DiscountInput,
    ) -> impl Future<Output = Result<String, ShopifyError>> + Send;

    /// Update an automatic discount, returning the node gid.
    fn update_discount(
        &self,
        id: &str,
        input: &DiscountInput,
    ) -> impl Future<Output = Result<String, ShopifyError>> + Send;
}

impl<P: DiscountPlatform + Sync> DiscountPlatform for &P {
    fn fetch_customer_tags(
        &self,
        id: ShopifyCustomerId,
    ) -> impl Future<Output = Result<String, ShopifyError>> + Send {
        (**self).fetch_customer_tags(id)
    }

    fn save_customer_tags(
        &self,
        id: ShopifyCustomerId,
        tags: &str,
    ) -> impl Future<Output = Result<(), ShopifyError>> + Send {
        (**self).save_customer_tags(id, tags)
    }

    fn find_segment(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, ShopifyError>> + Send {
        (**self).find_segment(name)
    }

    fn create_segment(
        &self,
        name: &str,
        query: &str,
    ) -> impl Future<Output = Result<String, ShopifyError>> + Send {
        (**self).create_segment(name, query)
    }

    fn get_discount_node(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<String>, ShopifyError>> + Send {
        (**self).get_discount_node(id)
    }

    fn find_discount_by_title(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Option<String>, ShopifyError>> + Send {
        (**self).find_discount_by_title(title)
    }

    fn create_discount(
        &self,
        input: &DiscountInput,
    ) -> impl Future<Output = Result<String, ShopifyError>> + Send {
        (**self).create_discount(input)
    }

    fn update_discount(
        &self,
        id: &str,
        input: &DiscountInput,
    ) -> impl Future<Output = Result<String, ShopifyError>> + Send {
        (**self).update_discount(id, input)
    }
}

impl DiscountPlatform for AdminClient {
    async fn fetch_customer_tags(&self, id: ShopifyCustomerId) -> Result<String, ShopifyError> {
        Ok(self.get_customer(id).await?.tags)
    }

    async fn save_customer_tags(
        &self,
        id: ShopifyCustomerId,
        tags: &str,
    ) -> Result<(), ShopifyError> {
        self.update_customer_tags(id, tags).await
    }

    async fn find_segment(&self, name: &str) -> Result<Option<String>, ShopifyError> {
        self.find_segment_by_name(name).await
    }

    async fn create_segment(&self, name: &str, query: &str) -> Result<String, ShopifyError> {
        Self::create_segment(self, name, query).await
    }

    async fn get_discount_node(&self, id: &str) -> Result<Option<String>, ShopifyError> {
        Self::get_discount_node(self, id).await
    }

    async fn find_discount_by_title(&self, title: &str) -> Result<Option<String>, ShopifyError> {
        Self::find_discount_by_title(self, title).await
    }

    async fn create_discount(&self, input: &DiscountInput) -> Result<String, ShopifyError> {
        self.create_automatic_discount(input).await
    }

    async fn update_discount(
        &self,
        id: &str,
        input: &DiscountInput,
    ) -> Result<String, ShopifyError> {
        self.update_automatic_discount(id, input).await
    }
}

// =============================================================================
// Deterministic naming
// =============================================================================

/// Segment name for a local customer id.
#[must_use]
pub fn segment_name(customer_id: CustomerId) -> String {
    format!("Customer_{customer_id}_Discount_Segment")
}

/// Segment member query matching the customer's marker tag.
#[must_use]
pub fn segment_query(customer_id: CustomerId) -> String {
    format!("customer_tags CONTAINS '{}'", tags::marker_tag(customer_id))
}

/// Discount title for a customer. The local id suffix keeps titles unique
/// even when two customers share a display name.
#[must_use]
pub fn discount_title(
    display_name: Option<&str>,
    percentage: Percentage,
    customer_id: CustomerId,
) -> String {
    let name = display_name.map_or_else(
        || format!("Customer_{customer_id}"),
        |name| name.replace(' ', "_"),
    );
    format!("Discount_For_{name}_{percentage}_Percent_{customer_id}")
}

// =============================================================================
// Service
// =============================================================================

/// Reconciliation orchestrator, generic over the remote platform.
pub struct DiscountService<P> {
    platform: P,
}

impl<P: DiscountPlatform> DiscountService<P> {
    /// Create a new discount service.
    pub const fn new(platform: P) -> Self {
        Self { platform }
    }

    /// Drive Shopify to the desired discount state for one customer.
    ///
    /// Tag save failures are logged and tolerated; every other remote
    /// failure aborts. The caller persists the returned outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::UnconfirmedIdentity`] before any remote call
    /// if the customer's Shopify id is missing or zero, and the other
    /// [`DiscountError`] variants for remote or validation failures.
    pub async fn set_customer_discount(
        &self,
        customer: &Customer,
        percentage: Percentage,
        scope: &TargetScope,
    ) -> Result<DiscountOutcome, DiscountError> {
        let shopify_id = customer
            .confirmed_shopify_id()
            .ok_or(DiscountError::UnconfirmedIdentity)?;

        // Tags first: the segment matches on the marker tag, so the tag must
        // exist before the segment can ever have members.
        let existing = self.platform.fetch_customer_tags(shopify_id).await?;
        let tags = synchronize_tags(&existing, percentage, customer.id);

        if let Err(err) = self.platform.save_customer_tags(shopify_id, &tags).await {
            tracing::warn!(
                customer_id = %customer.id,
                error = %err,
                "failed to save customer tags, continuing reconciliation"
            );
        }

        let segment_id = self.resolve_segment(customer.id).await?;

        let title = discount_title(customer.display_name().as_deref(), percentage, customer.id);
        let existing_discount = self
            .resolve_discount(customer.shopify_discount_id.as_deref(), &title)
            .await?;

        let mut input = DiscountInput {
            title,
            segment_id,
            percentage,
            scope: scope.clone(),
            starts_at: None,
        };

        let discount_id = match existing_discount {
            Some(id) => self.platform.update_discount(&id, &input).await?,
            None => {
                input.starts_at = Some(chrono::Utc::now());
                self.platform.create_discount(&input).await?
            }
        };

        tracing::info!(
            customer_id = %customer.id,
            discount_id = %discount_id,
            percentage = %percentage,
            "discount reconciled"
        );

        Ok(DiscountOutcome { discount_id, tags })
    }

    /// Reuse the deterministic segment if it exists, create it otherwise.
    ///
    /// The lookup-then-create window can race with a concurrent call for the
    /// same customer; the loser creates a duplicate segment that is left to
    /// manual cleanup.
    async fn resolve_segment(&self, customer_id: CustomerId) -> Result<String, DiscountError> {
        let name = segment_name(customer_id);

        if let Some(id) = self.platform.find_segment(&name).await? {
            return Ok(id);
        }

        Ok(self
            .platform
            .create_segment(&name, &segment_query(customer_id))
            .await?)
    }

    /// Resolve the existing discount: stored gid first, exact title second.
    async fn resolve_discount(
        &self,
        stored_id: Option<&str>,
        title: &str,
    ) -> Result<Option<String>, DiscountError> {
        if let Some(stored) = stored_id
            && let Some(id) = self.platform.get_discount_node(stored).await?
        {
            return Ok(Some(id));
        }

        Ok(self.platform.find_discount_by_title(title).await?)
    }
}
