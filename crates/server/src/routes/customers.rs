//! Customer CRUD and discount routes.
//!
//! Local rows are created first and mirrored to Shopify afterwards; a failed
//! mirror leaves the row with an unconfirmed identity and is rescued later
//! (by email) when the discount route runs.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use tier_discounts_core::{CustomerDetailId, CustomerId, Email, Percentage, TargetScope};

use crate::db::{CustomerDetailRepository, CustomerRepository};
use crate::error::AppError;
use crate::models::{Customer, CustomerDetail, NewCustomer};
use crate::services::DiscountService;
use crate::shopify::AdminClient;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CustomerPayload {
    email: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiscountPayload {
    percentage: f64,
    target_type: String,
    #[serde(default)]
    target_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailPayload {
    title: String,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    #[serde(flatten)]
    customer: Customer,
    details: Vec<CustomerDetail>,
}

#[derive(Debug, Serialize)]
pub struct DiscountResponse {
    discount_id: String,
    tags: String,
}

fn parse_email(raw: &str) -> Result<Email, AppError> {
    Email::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// `GET /customers`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = CustomerRepository::new(state.pool()).list_all().await?;
    Ok(Json(customers))
}

/// `GET /customers/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CustomerResponse>, AppError> {
    let id = CustomerId::new(id);
    let customer = CustomerRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?;
    let details = CustomerDetailRepository::new(state.pool())
        .list_for_customer(id)
        .await?;

    Ok(Json(CustomerResponse { customer, details }))
}

/// `POST /customers`. Creates locally, then mirrors to Shopify.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<Customer>, AppError> {
    let email = parse_email(&payload.email)?;
    let repo = CustomerRepository::new(state.pool());

    let mut customer = repo
        .create(&NewCustomer {
            email,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    // Mirror best-effort; an unconfirmed row is rescued later by email.
    match state.shopify().await {
        Ok(client) => {
            if let Err(err) = mirror_to_shopify(&repo, client, &mut customer).await {
                tracing::warn!(
                    customer_id = %customer.id,
                    error = %err,
                    "failed to mirror customer to Shopify"
                );
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "no Shopify session, customer left unconfirmed");
        }
    }

    Ok(Json(customer))
}

/// `POST /customers/{id}`. Updates locally, pushes to Shopify if confirmed.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<Customer>, AppError> {
    let email = parse_email(&payload.email)?;
    let repo = CustomerRepository::new(state.pool());

    let customer = repo
        .update_profile(
            CustomerId::new(id),
            &email,
            payload.first_name.as_deref(),
            payload.last_name.as_deref(),
        )
        .await?;

    if let Some(shopify_id) = customer.confirmed_shopify_id()
        && let Ok(client) = state.shopify().await
        && let Err(err) = client
            .update_customer(
                shopify_id,
                &customer.email,
                customer.first_name.as_deref(),
                customer.last_name.as_deref(),
            )
            .await
    {
        tracing::warn!(
            customer_id = %customer.id,
            error = %err,
            "failed to push customer update to Shopify"
        );
    }

    Ok(Json(customer))
}

/// `POST /customers/{id}/delete`. Best-effort remote delete, then local.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = CustomerId::new(id);
    let repo = CustomerRepository::new(state.pool());

    let customer = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?;

    if let Some(shopify_id) = customer.confirmed_shopify_id()
        && let Ok(client) = state.shopify().await
        && let Err(err) = client.delete_customer(shopify_id).await
    {
        tracing::warn!(
            customer_id = %id,
            error = %err,
            "failed to delete customer on Shopify"
        );
    }

    repo.delete(id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// `POST /customers/{id}/discount`. Stores desired state and reconciles.
pub async fn set_discount(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<DiscountPayload>,
) -> Result<Json<DiscountResponse>, AppError> {
    let percentage = Percentage::new(payload.percentage)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let scope = TargetScope::from_parts(&payload.target_type, payload.target_ids)
        .ok_or_else(|| {
            AppError::BadRequest(format!("unknown target type: {}", payload.target_type))
        })?;

    let id = CustomerId::new(id);
    let repo = CustomerRepository::new(state.pool());

    let mut customer = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?;

    // Desired state is stored before touching Shopify, so a failed
    // reconciliation can be retried from the local row.
    repo.set_discount_config(id, percentage.value(), &scope)
        .await?;
    customer.discount_percentage = percentage.value();
    customer.discount_target_type = scope.type_name().to_string();
    customer.discount_target_ids = scope.ids().to_vec();

    let client = state.shopify().await?;

    if customer.confirmed_shopify_id().is_none() {
        rescue_identity(&repo, client, &mut customer).await?;
    }

    let service = DiscountService::new(client);
    let outcome = service
        .set_customer_discount(&customer, percentage, &scope)
        .await?;

    repo.record_reconciliation(id, &outcome.discount_id, &outcome.tags)
        .await?;

    Ok(Json(DiscountResponse {
        discount_id: outcome.discount_id,
        tags: outcome.tags,
    }))
}

/// `POST /customers/{id}/details`
pub async fn create_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<DetailPayload>,
) -> Result<Json<CustomerDetail>, AppError> {
    let detail = CustomerDetailRepository::new(state.pool())
        .create(
            CustomerId::new(id),
            &payload.title,
            payload.body.as_deref(),
        )
        .await?;
    Ok(Json(detail))
}

/// `POST /details/{id}`
pub async fn update_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<DetailPayload>,
) -> Result<Json<CustomerDetail>, AppError> {
    let detail = CustomerDetailRepository::new(state.pool())
        .update(
            CustomerDetailId::new(id),
            &payload.title,
            payload.body.as_deref(),
        )
        .await?;
    Ok(Json(detail))
}

/// `POST /details/{id}/delete`
pub async fn delete_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    CustomerDetailRepository::new(state.pool())
        .delete(CustomerDetailId::new(id))
        .await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Push a freshly created local customer to Shopify, adopting an existing
/// remote customer with the same email instead of creating a duplicate.
async fn mirror_to_shopify(
    repo: &CustomerRepository<'_>,
    client: &AdminClient,
    customer: &mut Customer,
) -> Result<(), AppError> {
    let remote = match client.find_customer_by_email(&customer.email).await? {
        Some(existing) => existing,
        None => {
            client
                .create_customer(
                    &customer.email,
                    customer.first_name.as_deref(),
                    customer.last_name.as_deref(),
                )
                .await?
        }
    };

    let shopify_id = tier_discounts_core::ShopifyCustomerId::new(remote.id);
    repo.set_shopify_id(customer.id, shopify_id).await?;
    customer.shopify_id = Some(shopify_id);
    Ok(())
}

/// Rescue an unconfirmed identity by email lookup before reconciling.
///
/// Not finding the customer is fine here; the orchestrator rejects the
/// unconfirmed identity with a clear error.
async fn rescue_identity(
    repo: &CustomerRepository<'_>,
    client: &AdminClient,
    customer: &mut Customer,
) -> Result<(), AppError> {
    if let Some(remote) = client.find_customer_by_email(&customer.email).await? {
        let shopify_id = tier_discounts_core::ShopifyCustomerId::new(remote.id);
        repo.set_shopify_id(customer.id, shopify_id).await?;
        customer.shopify_id = Some(shopify_id);
        tracing::info!(
            customer_id = %customer.id,
            shopify_id = %shopify_id,
            "adopted Shopify identity by email"
        );
    }
    Ok(())
}
