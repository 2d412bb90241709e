//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::SessionRepository;
use crate::services::DiscountError;
use crate::shopify::{AdminClient, ShopifyError};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    shopify_client: AdminClient,
}

impl AppState {
    /// Build the application state.
    #[must_use]
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let shopify_client = AdminClient::new(&config.shopify);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify_client,
            }),
        }
    }

    /// Application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Shopify Admin client with a session token loaded.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::NoSession` if no offline token is available
    /// for the configured shop, either in memory or in the `sessions` table.
    pub async fn shopify(&self) -> Result<&AdminClient, DiscountError> {
        let sessions = SessionRepository::new(&self.inner.pool);
        match self.inner.shopify_client.ensure_session(&sessions).await {
            Ok(()) => Ok(&self.inner.shopify_client),
            Err(ShopifyError::NoSession(shop)) => Err(DiscountError::NoSession(shop)),
            Err(other) => Err(DiscountError::Shopify(other)),
        }
    }
}
