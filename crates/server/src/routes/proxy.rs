//! App Proxy routes served to the storefront.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use tier_discounts_core::ShopifyCustomerId;

use crate::db::CustomerRepository;
use crate::error::AppError;
use crate::services::eligibility::{self, Eligibility, NoMembership};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DiscountQuery {
    product_id: Option<String>,
    customer_id: Option<i64>,
}

/// `GET /apps/proxy/discount`. Storefront eligibility check.
///
/// Always answers 200 with `{percent, eligible}` once the request is
/// well-formed; unknown customers, disabled discounts, and remote failures
/// all read as not eligible. Signature verification happens in middleware.
pub async fn discount(
    State(state): State<AppState>,
    Query(params): Query<DiscountQuery>,
) -> Result<Json<Eligibility>, AppError> {
    let product_id = params
        .product_id
        .ok_or_else(|| AppError::BadRequest("product_id is required".to_string()))?;
    let customer_id = params
        .customer_id
        .ok_or_else(|| AppError::BadRequest("customer_id is required".to_string()))?;

    let repo = CustomerRepository::new(state.pool());
    let customer = match repo
        .get_by_shopify_id(ShopifyCustomerId::new(customer_id))
        .await
    {
        Ok(Some(customer)) => customer,
        Ok(None) => return Ok(Json(Eligibility::none())),
        Err(err) => {
            tracing::warn!(error = %err, "customer lookup failed, denying eligibility");
            return Ok(Json(Eligibility::none()));
        }
    };

    let percentage = match customer.percentage() {
        Ok(percentage) => percentage,
        Err(err) => {
            tracing::warn!(
                customer_id = %customer.id,
                error = %err,
                "stored percentage out of range, denying eligibility"
            );
            return Ok(Json(Eligibility::none()));
        }
    };
    let scope = customer.discount_scope();

    // Collection scopes need a Shopify session; without one they deny.
    let answer = match state.shopify().await {
        Ok(client) => eligibility::evaluate(&product_id, percentage, scope.as_ref(), client).await,
        Err(_) => {
            eligibility::evaluate(&product_id, percentage, scope.as_ref(), &NoMembership).await
        }
    };

    Ok(Json(answer))
}
