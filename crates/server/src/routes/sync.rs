//! Bulk customer sync from Shopify.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use tier_discounts_core::{Email, ShopifyCustomerId};

use crate::db::CustomerRepository;
use crate::error::AppError;
use crate::state::AppState;

const PAGE_SIZE: u32 = 250;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    synced: usize,
    skipped: usize,
}

/// `POST /sync/customers`. Pulls all Shopify customers and upsert locally.
///
/// Merges on email; profile fields and the tag cache follow Shopify, local
/// discount configuration is preserved. Customers without a usable email
/// are skipped and counted.
pub async fn customers(State(state): State<AppState>) -> Result<Json<SyncResponse>, AppError> {
    let client = state.shopify().await?;
    let repo = CustomerRepository::new(state.pool());

    let mut synced = 0;
    let mut skipped = 0;
    let mut since_id: Option<i64> = None;

    loop {
        let page = client.list_customers(since_id, PAGE_SIZE).await?;
        let Some(last) = page.last() else {
            break;
        };
        since_id = Some(last.id);

        for remote in page {
            let Some(email) = remote.email.as_deref().and_then(|e| Email::parse(e).ok())
            else {
                tracing::debug!(shopify_id = remote.id, "skipping customer without email");
                skipped += 1;
                continue;
            };

            repo.upsert_from_shopify(
                &email,
                ShopifyCustomerId::new(remote.id),
                remote.first_name.as_deref(),
                remote.last_name.as_deref(),
                Some(&remote.tags),
            )
            .await?;
            synced += 1;
        }
    }

    tracing::info!(synced, skipped, "customer sync complete");
    Ok(Json(SyncResponse { synced, skipped }))
}
