//! Automatic discount operations.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use tier_discounts_core::{Percentage, TargetScope, gid};

use super::client::AdminClient;
use super::segments::{UserError, join_user_errors};
use super::ShopifyError;

const DISCOUNT_NODE_QUERY: &str = r#"
    query DiscountNode($id: ID!) {
        discountNode(id: $id) {
            id
            discount {
                __typename
                ... on DiscountAutomaticBasic {
                    title
                }
            }
        }
    }
"#;

const FIND_DISCOUNT_QUERY: &str = r#"
    query FindAutomaticDiscount($query: String!) {
        automaticDiscountNodes(first: 10, query: $query) {
            edges {
                node {
                    id
                    automaticDiscount {
                        __typename
                        ... on DiscountAutomaticBasic {
                            title
                        }
                    }
                }
            }
        }
    }
"#;

const DISCOUNT_CREATE_MUTATION: &str = r"
    mutation DiscountAutomaticBasicCreate($input: DiscountAutomaticBasicInput!) {
        discountAutomaticBasicCreate(automaticBasicDiscount: $input) {
            automaticDiscountNode {
                id
            }
            userErrors {
                field
                message
            }
        }
    }
";

const DISCOUNT_UPDATE_MUTATION: &str = r"
    mutation DiscountAutomaticBasicUpdate($id: ID!, $input: DiscountAutomaticBasicInput!) {
        discountAutomaticBasicUpdate(id: $id, automaticBasicDiscount: $input) {
            automaticDiscountNode {
                id
            }
            userErrors {
                field
                message
            }
        }
    }
";

/// Input for creating or updating a per-customer automatic discount.
#[derive(Debug, Clone)]
pub struct DiscountInput {
    /// Deterministic discount title.
    pub title: String,
    /// Segment gid the discount is scoped to.
    pub segment_id: String,
    /// Discount percentage.
    pub percentage: Percentage,
    /// What the discount applies to.
    pub scope: TargetScope,
    /// Start time; only sent on create.
    pub starts_at: Option<DateTime<Utc>>,
}

impl DiscountInput {
    /// Render the `customerGets.items` clause for the target scope.
    ///
    /// An explicit-id scope with an empty id list collapses to all items;
    /// the mutation rejects empty `productsToAdd`/`add` arrays.
    fn items(&self) -> serde_json::Value {
        match &self.scope {
            TargetScope::All => serde_json::json!({ "all": true }),
            TargetScope::Products(ids) => {
                if ids.is_empty() {
                    return serde_json::json!({ "all": true });
                }
                let gids: Vec<String> = ids.iter().map(|id| gid::product(id)).collect();
                serde_json::json!({ "products": { "productsToAdd": gids } })
            }
            TargetScope::Collections(ids) => {
                if ids.is_empty() {
                    return serde_json::json!({ "all": true });
                }
                let gids: Vec<String> = ids.iter().map(|id| gid::collection(id)).collect();
                serde_json::json!({ "collections": { "add": gids } })
            }
        }
    }

    /// Render the full `DiscountAutomaticBasicInput` payload.
    fn payload(&self) -> serde_json::Value {
        let mut input = serde_json::json!({
            "title": self.title,
            "context": {
                "customerSegments": {
                    "add": [self.segment_id]
                }
            },
            "customerGets": {
                "value": {
                    "percentage": self.percentage.fraction()
                },
                "items": self.items()
            }
        });

        if let (Some(starts_at), Some(obj)) = (self.starts_at, input.as_object_mut()) {
            obj.insert(
                "startsAt".to_string(),
                serde_json::Value::String(starts_at.to_rfc3339()),
            );
        }

        input
    }
}

#[derive(Debug, Deserialize)]
struct DiscountNodeResponse {
    #[serde(rename = "discountNode")]
    discount_node: Option<DiscountNode>,
}

#[derive(Debug, Deserialize)]
struct DiscountNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AutomaticDiscountNodesResponse {
    #[serde(rename = "automaticDiscountNodes")]
    automatic_discount_nodes: AutomaticDiscountConnection,
}

#[derive(Debug, Deserialize)]
struct AutomaticDiscountConnection {
    edges: Vec<AutomaticDiscountEdge>,
}

#[derive(Debug, Deserialize)]
struct AutomaticDiscountEdge {
    node: AutomaticDiscountNode,
}

#[derive(Debug, Deserialize)]
struct AutomaticDiscountNode {
    id: String,
    #[serde(rename = "automaticDiscount")]
    automatic_discount: AutomaticDiscount,
}

#[derive(Debug, Deserialize)]
struct AutomaticDiscount {
    #[serde(rename = "__typename")]
    typename: String,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscountCreateResponse {
    #[serde(rename = "discountAutomaticBasicCreate")]
    payload: DiscountMutationPayload,
}

#[derive(Debug, Deserialize)]
struct DiscountUpdateResponse {
    #[serde(rename = "discountAutomaticBasicUpdate")]
    payload: DiscountMutationPayload,
}

#[derive(Debug, Deserialize)]
struct DiscountMutationPayload {
    #[serde(rename = "automaticDiscountNode")]
    automatic_discount_node: Option<DiscountNode>,
    #[serde(rename = "userErrors", default)]
    user_errors: Vec<UserError>,
}

impl AdminClient {
    /// Check whether a stored discount gid still resolves to a node.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` variants on transport or GraphQL failures.
    #[instrument(skip(self))]
    pub async fn get_discount_node(&self, id: &str) -> Result<Option<String>, ShopifyError> {
        let variables = serde_json::json!({ "id": id });

        let response: DiscountNodeResponse =
            self.execute(DISCOUNT_NODE_QUERY, Some(variables)).await?;

        Ok(response.discount_node.map(|node| node.id))
    }

    /// Find an automatic basic discount by exact title.
    ///
    /// The title search is fuzzy on Shopify's side; only a
    /// `DiscountAutomaticBasic` whose title matches exactly is returned.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` variants on transport or GraphQL failures.
    #[instrument(skip(self))]
    pub async fn find_discount_by_title(
        &self,
        title: &str,
    ) -> Result<Option<String>, ShopifyError> {
        let variables = serde_json::json!({ "query": format!("title:'{title}'") });

        let response: AutomaticDiscountNodesResponse = self
            .execute(FIND_DISCOUNT_QUERY, Some(variables))
            .await?;

        Ok(response
            .automatic_discount_nodes
            .edges
            .into_iter()
            .map(|edge| edge.node)
            .find(|node| {
                node.automatic_discount.typename == "DiscountAutomaticBasic"
                    && node.automatic_discount.title.as_deref() == Some(title)
            })
            .map(|node| node.id))
    }

    /// Create an automatic basic discount. Returns the new node gid.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` if the mutation reports user errors,
    /// or other variants on transport or GraphQL failures.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_automatic_discount(
        &self,
        input: &DiscountInput,
    ) -> Result<String, ShopifyError> {
        let variables = serde_json::json!({ "input": input.payload() });

        let response: DiscountCreateResponse = self
            .execute(DISCOUNT_CREATE_MUTATION, Some(variables))
            .await?;

        extract_discount_id(response.payload)
    }

    /// Update an automatic basic discount in place, re-asserting the full
    /// desired state. Returns the node gid, which is authoritative.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` if the mutation reports user errors,
    /// or other variants on transport or GraphQL failures.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn update_automatic_discount(
        &self,
        id: &str,
        input: &DiscountInput,
    ) -> Result<String, ShopifyError> {
        let variables = serde_json::json!({ "id": id, "input": input.payload() });

        let response: DiscountUpdateResponse = self
            .execute(DISCOUNT_UPDATE_MUTATION, Some(variables))
            .await?;

        extract_discount_id(response.payload)
    }
}

fn extract_discount_id(payload: DiscountMutationPayload) -> Result<String, ShopifyError> {
    if !payload.user_errors.is_empty() {
        return Err(ShopifyError::UserError(join_user_errors(
            &payload.user_errors,
        )));
    }

    payload
        .automatic_discount_node
        .map(|node| node.id)
        .ok_or_else(|| ShopifyError::NotFound("discount mutation returned no node".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(scope: TargetScope) -> DiscountInput {
        DiscountInput {
            title: "Discount_For_Jane_Doe_10_Percent_7".to_string(),
            segment_id: "gid://shopify/Segment/1".to_string(),
            percentage: Percentage::new(10.0).unwrap(),
            scope,
            starts_at: None,
        }
    }

    #[test]
    fn test_items_all() {
        let items = input(TargetScope::All).items();
        assert_eq!(items, serde_json::json!({ "all": true }));
    }

    #[test]
    fn test_items_products_normalized_to_gids() {
        let items = input(TargetScope::Products(vec![
            "123".to_string(),
            "gid://shopify/Product/456".to_string(),
        ]))
        .items();
        assert_eq!(
            items,
            serde_json::json!({
                "products": {
                    "productsToAdd": ["gid://shopify/Product/123", "gid://shopify/Product/456"]
                }
            })
        );
    }

    #[test]
    fn test_items_collections() {
        let items = input(TargetScope::Collections(vec!["9".to_string()])).items();
        assert_eq!(
            items,
            serde_json::json!({ "collections": { "add": ["gid://shopify/Collection/9"] } })
        );
    }

    #[test]
    fn test_items_empty_id_list_collapses_to_all() {
        let items = input(TargetScope::Products(vec![])).items();
        assert_eq!(items, serde_json::json!({ "all": true }));
    }

    #[test]
    fn test_payload_percentage_is_a_fraction() {
        let payload = input(TargetScope::All).payload();
        let fraction = payload["customerGets"]["value"]["percentage"]
            .as_f64()
            .unwrap();
        assert!((fraction - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn test_payload_includes_starts_at_only_when_set() {
        let mut i = input(TargetScope::All);
        assert!(i.payload().get("startsAt").is_none());

        i.starts_at = Some(Utc::now());
        assert!(i.payload().get("startsAt").is_some());
    }

    #[test]
    fn test_payload_targets_the_segment() {
        let payload = input(TargetScope::All).payload();
        assert_eq!(
            payload["context"]["customerSegments"]["add"][0],
            "gid://shopify/Segment/1"
        );
    }
}
