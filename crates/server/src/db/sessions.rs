//! Offline session storage: shop domain to Admin API access token.

use secrecy::SecretString;
use sqlx::PgPool;

use super::RepositoryError;

/// Normalize a shop identifier to a full `*.myshopify.com` domain.
///
/// Accepts a bare store handle ("my-store"), a full domain, or mixed casing,
/// matching what Shopify sends in the `shop` query parameter.
#[must_use]
pub fn normalize_shop_domain(shop: &str) -> String {
    let shop = shop.trim().to_lowercase();
    if shop.contains('.') {
        shop
    } else {
        format!("{shop}.myshopify.com")
    }
}

/// Repository for offline Shopify session tokens.
pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up the offline access token for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_token(&self, shop: &str) -> Result<Option<SecretString>, RepositoryError> {
        let token: Option<(String,)> =
            sqlx::query_as("SELECT access_token FROM sessions WHERE shop = $1")
                .bind(normalize_shop_domain(shop))
                .fetch_optional(self.pool)
                .await?;

        Ok(token.map(|(t,)| SecretString::from(t)))
    }

    /// Store or replace the offline access token for a shop.
    ///
    /// Written by the OAuth install flow, which runs outside this service;
    /// request handling only reads tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn store_token(
        &self,
        shop: &str,
        access_token: &str,
        scope: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sessions (shop, access_token, scope) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (shop) DO UPDATE \
             SET access_token = EXCLUDED.access_token, \
                 scope = EXCLUDED.scope, \
                 updated_at = now()",
        )
        .bind(normalize_shop_domain(shop))
        .bind(access_token)
        .bind(scope)
        .execute(self.pool)
        .await?;

        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bare_handle() {
        assert_eq!(normalize_shop_domain("my-store"), "my-store.myshopify.com");
    }

    #[test]
    fn test_normalize_full_domain_untouched() {
        assert_eq!(
            normalize_shop_domain("my-store.myshopify.com"),
            "my-store.myshopify.com"
        );
    }

    #[test]
    fn test_normalize_lowercases_and_trims() {
        assert_eq!(
            normalize_shop_domain("  My-Store.MyShopify.com "),
            "my-store.myshopify.com"
        );
    }
}
