//! REST customer operations.

use reqwest::Method;
use tracing::instrument;

use tier_discounts_core::{Email, ShopifyCustomerId};

use super::client::AdminClient;
use super::types::{CustomerEnvelope, CustomerPayload, CustomersEnvelope, RemoteCustomer};
use super::ShopifyError;

impl AdminClient {
    /// Fetch a customer by Shopify id.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the customer does not exist, or
    /// other `ShopifyError` variants on transport failures.
    #[instrument(skip(self))]
    pub async fn get_customer(
        &self,
        id: ShopifyCustomerId,
    ) -> Result<RemoteCustomer, ShopifyError> {
        let envelope: CustomerEnvelope = self
            .rest(Method::GET, &format!("customers/{id}.json"), None)
            .await?;
        Ok(envelope.customer)
    }

    /// Find a customer by exact email address.
    ///
    /// Shopify's search endpoint matches loosely, so the results are filtered
    /// down to a case-insensitive exact match before anything is adopted.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` variants on transport failures.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn find_customer_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<RemoteCustomer>, ShopifyError> {
        let envelope: CustomersEnvelope = self
            .rest(
                Method::GET,
                &format!("customers/search.json?query=email:{}", email.normalized()),
                None,
            )
            .await?;

        Ok(envelope
            .customers
            .into_iter()
            .find(|c| c.email.as_deref().is_some_and(|e| email.matches(e))))
    }

    /// Create a customer on Shopify.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` if Shopify rejects the payload
    /// (e.g., the email is already taken), or other variants on transport
    /// failures.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn create_customer(
        &self,
        email: &Email,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<RemoteCustomer, ShopifyError> {
        let body = serde_json::json!({
            "customer": CustomerPayload {
                id: None,
                email: Some(email.as_str()),
                first_name,
                last_name,
                tags: None,
            }
        });

        let envelope: CustomerEnvelope = self
            .rest(Method::POST, "customers.json", Some(body))
            .await?;
        Ok(envelope.customer)
    }

    /// Update a customer's profile fields on Shopify.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` variants on transport failures.
    #[instrument(skip(self))]
    pub async fn update_customer(
        &self,
        id: ShopifyCustomerId,
        email: &Email,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<RemoteCustomer, ShopifyError> {
        let body = serde_json::json!({
            "customer": CustomerPayload {
                id: Some(id.as_i64()),
                email: Some(email.as_str()),
                first_name,
                last_name,
                tags: None,
            }
        });

        let envelope: CustomerEnvelope = self
            .rest(Method::PUT, &format!("customers/{id}.json"), Some(body))
            .await?;
        Ok(envelope.customer)
    }

    /// Replace a customer's tag string.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` variants on transport failures.
    #[instrument(skip(self, tags))]
    pub async fn update_customer_tags(
        &self,
        id: ShopifyCustomerId,
        tags: &str,
    ) -> Result<(), ShopifyError> {
        let body = serde_json::json!({
            "customer": CustomerPayload {
                id: Some(id.as_i64()),
                email: None,
                first_name: None,
                last_name: None,
                tags: Some(tags),
            }
        });

        let _: serde_json::Value = self
            .rest(Method::PUT, &format!("customers/{id}.json"), Some(body))
            .await?;
        Ok(())
    }

    /// Delete a customer on Shopify.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` variants on transport failures.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: ShopifyCustomerId) -> Result<(), ShopifyError> {
        let _: serde_json::Value = self
            .rest(Method::DELETE, &format!("customers/{id}.json"), None)
            .await?;
        Ok(())
    }

    /// Fetch a page of customers for the sync job.
    ///
    /// Pagination is by `since_id`; an empty page means the sync is done.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` variants on transport failures.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        since_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<RemoteCustomer>, ShopifyError> {
        let path = since_id.map_or_else(
            || format!("customers.json?limit={limit}"),
            |since| format!("customers.json?limit={limit}&since_id={since}"),
        );

        let envelope: CustomersEnvelope = self.rest(Method::GET, &path, None).await?;
        Ok(envelope.customers)
    }
}
