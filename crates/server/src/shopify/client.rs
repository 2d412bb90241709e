//! Low-level Shopify Admin API transport.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::instrument;

use super::{GraphQLError, GraphQLErrorLocation, ShopifyError};
use crate::config::ShopifyConfig;
use crate::db::SessionRepository;

/// Shopify Admin API client.
///
/// Cheap to clone; all state lives behind an `Arc`. The offline access token
/// is cached in memory and loaded from the `sessions` table on first use when
/// not provided via environment.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    store: String,
    api_version: String,
    /// In-memory token cache
    token: RwLock<Option<SecretString>>,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            inner: Arc::new(AdminClientInner {
                client,
                store: config.store.clone(),
                api_version: config.api_version.clone(),
                token: RwLock::new(config.access_token.clone()),
            }),
        }
    }

    /// The shop domain this client talks to.
    #[must_use]
    pub fn store(&self) -> &str {
        &self.inner.store
    }

    /// Set the access token directly (for loading from storage).
    pub async fn set_token(&self, token: SecretString) {
        *self.inner.token.write().await = Some(token);
    }

    /// Whether an access token is available.
    pub async fn has_token(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// Make sure an access token is loaded, pulling it from the session
    /// store when the in-memory cache is empty.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NoSession` if no token is stored for the shop.
    /// Returns `ShopifyError::Unauthorized` if the session lookup fails.
    pub async fn ensure_session(
        &self,
        sessions: &SessionRepository<'_>,
    ) -> Result<(), ShopifyError> {
        if self.has_token().await {
            return Ok(());
        }

        let token = sessions
            .get_token(&self.inner.store)
            .await
            .map_err(|e| ShopifyError::Unauthorized(format!("session lookup failed: {e}")))?
            .ok_or_else(|| ShopifyError::NoSession(self.inner.store.clone()))?;

        self.set_token(token).await;
        Ok(())
    }

    async fn access_token(&self) -> Result<String, ShopifyError> {
        let token = self.inner.token.read().await;
        token.as_ref().map_or_else(
            || Err(ShopifyError::NoSession(self.inner.store.clone())),
            |t| Ok(t.expose_secret().to_string()),
        )
    }

    fn rest_url(&self, path: &str) -> String {
        format!(
            "https://{}/admin/api/{}/{path}",
            self.inner.store, self.inner.api_version
        )
    }

    fn graphql_url(&self) -> String {
        self.rest_url("graphql.json")
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL query or mutation.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NoSession` if no token is available.
    /// Returns `ShopifyError::RateLimited` if Shopify is throttling us.
    /// Returns `ShopifyError::Unauthorized` if the token is rejected.
    /// Returns `ShopifyError::GraphQL` if the query returns errors.
    /// Returns `ShopifyError::Http` on network failures.
    #[instrument(skip(self, query, variables))]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, ShopifyError> {
        let access_token = self.access_token().await?;

        let body = serde_json::json!({
            "query": query,
            "variables": variables.unwrap_or(serde_json::Value::Null)
        });

        let response = self
            .inner
            .client
            .post(self.graphql_url())
            .header("X-Shopify-Access-Token", access_token)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ShopifyError::Unauthorized(
                "access token rejected".to_string(),
            ));
        }

        let graphql_response: GraphQLResponse<T> = response.json().await?;

        // Check for GraphQL errors
        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    locations: e
                        .locations
                        .into_iter()
                        .map(|l| GraphQLErrorLocation {
                            line: l.line,
                            column: l.column,
                        })
                        .collect(),
                    path: e.path,
                })
                .collect();
            return Err(ShopifyError::GraphQL(converted_errors));
        }

        graphql_response.data.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }

    // =========================================================================
    // REST Execution
    // =========================================================================

    /// Send a REST request and decode the JSON response.
    ///
    /// `DELETE` responses with empty bodies decode into `serde_json::Value`
    /// as `null` via the unit fallback, so callers use `Value` there.
    #[instrument(skip(self, body), fields(path = %path))]
    pub(super) async fn rest<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ShopifyError> {
        let access_token = self.access_token().await?;

        let mut request = self
            .inner
            .client
            .request(method, self.rest_url(path))
            .header("X-Shopify-Access-Token", access_token);

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ShopifyError::Unauthorized(
                "access token rejected".to_string(),
            ));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ShopifyError::NotFound(path.to_string()));
        }

        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let detail = response.text().await.unwrap_or_default();
            return Err(ShopifyError::UserError(detail));
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Api {
                status: status.as_u16(),
                message: detail,
            });
        }

        let text = response.text().await?;
        if text.is_empty() {
            return serde_json::from_str("null").map_err(Into::into);
        }
        serde_json::from_str(&text).map_err(Into::into)
    }
}
