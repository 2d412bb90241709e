//! Customer repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tier_discounts_core::{CustomerId, Email, ShopifyCustomerId, TargetScope};

use super::RepositoryError;
use crate::models::customer::{Customer, NewCustomer};

// =============================================================================
// Internal Row Types
// =============================================================================

const CUSTOMER_COLUMNS: &str = "id, shopify_id, email, first_name, last_name, \
     discount_percentage, discount_target_type, discount_target_ids, \
     shopify_discount_id, shopify_tags, created_at, updated_at";

/// Internal row type for `PostgreSQL` customer queries.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    shopify_id: Option<i64>,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    discount_percentage: f64,
    discount_target_type: String,
    discount_target_ids: Vec<String>,
    shopify_discount_id: Option<String>,
    shopify_tags: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            shopify_id: ShopifyCustomerId::confirmed(row.shopify_id),
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            discount_percentage: row.discount_percentage,
            discount_target_type: row.discount_target_type,
            discount_target_ids: row.discount_target_ids,
            shopify_discount_id: row.shopify_discount_id,
            shopify_tags: row.shopify_tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all customers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a customer by their local ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a customer by their Shopify ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_shopify_id(
        &self,
        shopify_id: ShopifyCustomerId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE shopify_id = $1"
        ))
        .bind(shopify_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a customer by email (the merge key, compared case-insensitively).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE lower(email) = $1"
        ))
        .bind(email.normalized())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a local customer row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other query failures.
    pub async fn create(&self, new: &NewCustomer) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "INSERT INTO customers (email, first_name, last_name) \
             VALUES ($1, $2, $3) \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(new.email.as_str())
        .bind(new.first_name.as_deref())
        .bind(new.last_name.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(unique_violation_to_conflict)?;

        row.try_into()
    }

    /// Update a customer's profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such customer exists.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    pub async fn update_profile(
        &self,
        id: CustomerId,
        email: &Email,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "UPDATE customers \
             SET email = $2, first_name = $3, last_name = $4, updated_at = now() \
             WHERE id = $1 \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(email.as_str())
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(self.pool)
        .await
        .map_err(unique_violation_to_conflict)?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Record the confirmed Shopify identity for a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such customer exists.
    pub async fn set_shopify_id(
        &self,
        id: CustomerId,
        shopify_id: ShopifyCustomerId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE customers SET shopify_id = $2, updated_at = now() WHERE id = $1")
                .bind(id.as_i32())
                .bind(shopify_id.as_i64())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store the desired discount configuration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such customer exists.
    pub async fn set_discount_config(
        &self,
        id: CustomerId,
        percentage: f64,
        scope: &TargetScope,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customers \
             SET discount_percentage = $2, discount_target_type = $3, \
                 discount_target_ids = $4, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(percentage)
        .bind(scope.type_name())
        .bind(scope.ids())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Cache the outcome of a successful reconciliation: the remote discount
    /// gid and the tag string that was written to Shopify.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such customer exists.
    pub async fn record_reconciliation(
        &self,
        id: CustomerId,
        discount_id: &str,
        tags: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customers \
             SET shopify_discount_id = $2, shopify_tags = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(discount_id)
        .bind(tags)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Upsert a customer pulled from Shopify, merging on email.
    ///
    /// Profile fields and the tag cache follow Shopify; the local discount
    /// configuration is left untouched for existing rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn upsert_from_shopify(
        &self,
        email: &Email,
        shopify_id: ShopifyCustomerId,
        first_name: Option<&str>,
        last_name: Option<&str>,
        tags: Option<&str>,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "INSERT INTO customers (email, shopify_id, first_name, last_name, shopify_tags) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (email) DO UPDATE \
             SET shopify_id = EXCLUDED.shopify_id, \
                 first_name = EXCLUDED.first_name, \
                 last_name = EXCLUDED.last_name, \
                 shopify_tags = EXCLUDED.shopify_tags, \
                 updated_at = now() \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(shopify_id.as_i64())
        .bind(first_name)
        .bind(last_name)
        .bind(tags)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Delete a customer row (details cascade).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such customer exists.
    pub async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Map a unique-constraint violation onto `Conflict`, everything else onto
/// `Database`.
fn unique_violation_to_conflict(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("email already exists".to_string());
    }
    RepositoryError::Database(err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row() -> CustomerRow {
        CustomerRow {
            id: 7,
            shopify_id: None,
            email: "jane@example.com".to_string(),
            first_name: None,
            last_name: None,
            discount_percentage: 10.0,
            discount_target_type: "all".to_string(),
            discount_target_ids: vec![],
            shopify_discount_id: None,
            shopify_tags: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stored_zero_shopify_id_decodes_as_unconfirmed() {
        let mut r = row();
        r.shopify_id = Some(0);
        let customer = Customer::try_from(r).unwrap();
        assert_eq!(customer.shopify_id, None);
    }

    #[test]
    fn test_positive_shopify_id_decodes_as_confirmed() {
        let mut r = row();
        r.shopify_id = Some(812);
        let customer = Customer::try_from(r).unwrap();
        assert_eq!(customer.shopify_id, Some(ShopifyCustomerId::new(812)));
    }

    #[test]
    fn test_invalid_email_is_data_corruption() {
        let mut r = row();
        r.email = "not-an-email".to_string();
        let err = Customer::try_from(r).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
