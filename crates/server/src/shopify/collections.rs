//! Collection membership lookup for eligibility checks.

use serde::Deserialize;
use tracing::instrument;

use tier_discounts_core::{CollectionKind, gid};

use super::client::AdminClient;
use super::ShopifyError;

const PRODUCT_COLLECTIONS_QUERY: &str = r"
    query ProductCollections($id: ID!) {
        product(id: $id) {
            inCollections: collections(first: 50) {
                edges {
                    node {
                        id
                        ruleSet {
                            appliedDisjunctively
                        }
                    }
                }
            }
        }
    }
";

/// A collection a product belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    /// Collection gid.
    pub id: String,
    /// Whether the collection is curated or rule-driven.
    pub kind: CollectionKind,
}

#[derive(Debug, Deserialize)]
struct ProductCollectionsResponse {
    product: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
struct ProductNode {
    #[serde(rename = "inCollections")]
    in_collections: CollectionConnection,
}

#[derive(Debug, Deserialize)]
struct CollectionConnection {
    edges: Vec<CollectionEdge>,
}

#[derive(Debug, Deserialize)]
struct CollectionEdge {
    node: CollectionNode,
}

#[derive(Debug, Deserialize)]
struct CollectionNode {
    id: String,
    #[serde(rename = "ruleSet")]
    rule_set: Option<serde_json::Value>,
}

impl AdminClient {
    /// List the collections a product belongs to (first 50).
    ///
    /// A collection with a rule set is rule-driven (smart); one without is
    /// manually curated.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the product does not exist, or
    /// other variants on transport or GraphQL failures.
    #[instrument(skip(self))]
    pub async fn product_collections(
        &self,
        product_id: &str,
    ) -> Result<Vec<CollectionRef>, ShopifyError> {
        let variables = serde_json::json!({ "id": gid::product(product_id) });

        let response: ProductCollectionsResponse = self
            .execute(PRODUCT_COLLECTIONS_QUERY, Some(variables))
            .await?;

        let product = response
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("product {product_id}")))?;

        Ok(product
            .in_collections
            .edges
            .into_iter()
            .map(|edge| CollectionRef {
                kind: if edge.node.rule_set.is_some() {
                    CollectionKind::Smart
                } else {
                    CollectionKind::Custom
                },
                id: edge.node.id,
            })
            .collect())
    }
}
