//! Customer detail repository: plain CRUD over the notes side table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tier_discounts_core::{CustomerDetailId, CustomerId};

use super::RepositoryError;
use crate::models::customer::CustomerDetail;

/// Internal row type for `PostgreSQL` customer detail queries.
#[derive(Debug, sqlx::FromRow)]
struct CustomerDetailRow {
    id: i32,
    customer_id: i32,
    title: String,
    body: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerDetailRow> for CustomerDetail {
    fn from(row: CustomerDetailRow) -> Self {
        Self {
            id: CustomerDetailId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            title: row.title,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for customer detail database operations.
pub struct CustomerDetailRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerDetailRepository<'a> {
    /// Create a new customer detail repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List details for a customer, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<CustomerDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerDetailRow>(
            "SELECT id, customer_id, title, body, created_at, updated_at \
             FROM customer_details WHERE customer_id = $1 ORDER BY created_at",
        )
        .bind(customer_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Attach a detail to a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including a
    /// missing customer, which violates the foreign key).
    pub async fn create(
        &self,
        customer_id: CustomerId,
        title: &str,
        body: Option<&str>,
    ) -> Result<CustomerDetail, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerDetailRow>(
            "INSERT INTO customer_details (customer_id, title, body) \
             VALUES ($1, $2, $3) \
             RETURNING id, customer_id, title, body, created_at, updated_at",
        )
        .bind(customer_id.as_i32())
        .bind(title)
        .bind(body)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a detail's title and body.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such detail exists.
    pub async fn update(
        &self,
        id: CustomerDetailId,
        title: &str,
        body: Option<&str>,
    ) -> Result<CustomerDetail, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerDetailRow>(
            "UPDATE customer_details \
             SET title = $2, body = $3, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, customer_id, title, body, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(title)
        .bind(body)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a detail.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such detail exists.
    pub async fn delete(&self, id: CustomerDetailId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer_details WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
