//! Customer segment operations.

use serde::Deserialize;
use tracing::instrument;

use super::client::AdminClient;
use super::ShopifyError;

const FIND_SEGMENT_QUERY: &str = r"
    query FindSegment($query: String!) {
        segments(first: 1, query: $query) {
            edges {
                node {
                    id
                    name
                }
            }
        }
    }
";

const SEGMENT_CREATE_MUTATION: &str = r"
    mutation SegmentCreate($name: String!, $query: String!) {
        segmentCreate(name: $name, query: $query) {
            segment {
                id
            }
            userErrors {
                field
                message
            }
        }
    }
";

#[derive(Debug, Deserialize)]
struct SegmentsResponse {
    segments: SegmentConnection,
}

#[derive(Debug, Deserialize)]
struct SegmentConnection {
    edges: Vec<SegmentEdge>,
}

#[derive(Debug, Deserialize)]
struct SegmentEdge {
    node: SegmentNode,
}

#[derive(Debug, Deserialize)]
struct SegmentNode {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SegmentCreateResponse {
    #[serde(rename = "segmentCreate")]
    segment_create: SegmentCreatePayload,
}

#[derive(Debug, Deserialize)]
struct SegmentCreatePayload {
    segment: Option<SegmentIdOnly>,
    #[serde(rename = "userErrors", default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct SegmentIdOnly {
    id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserError {
    pub message: String,
}

pub(super) fn join_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

impl AdminClient {
    /// Find a segment by exact name.
    ///
    /// Returns the segment gid, or `None` if no segment with that name
    /// exists. The search query matches loosely, so the result is checked
    /// for an exact name match.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` variants on transport or GraphQL failures.
    #[instrument(skip(self))]
    pub async fn find_segment_by_name(&self, name: &str) -> Result<Option<String>, ShopifyError> {
        let variables = serde_json::json!({ "query": format!("name:'{name}'") });

        let response: SegmentsResponse = self
            .execute(FIND_SEGMENT_QUERY, Some(variables))
            .await?;

        Ok(response
            .segments
            .edges
            .into_iter()
            .map(|edge| edge.node)
            .find(|node| node.name == name)
            .map(|node| node.id))
    }

    /// Create a segment with the given member query.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` if the mutation reports user errors,
    /// or other variants on transport or GraphQL failures.
    #[instrument(skip(self, query))]
    pub async fn create_segment(&self, name: &str, query: &str) -> Result<String, ShopifyError> {
        let variables = serde_json::json!({ "name": name, "query": query });

        let response: SegmentCreateResponse = self
            .execute(SEGMENT_CREATE_MUTATION, Some(variables))
            .await?;

        let payload = response.segment_create;
        if !payload.user_errors.is_empty() {
            return Err(ShopifyError::UserError(join_user_errors(
                &payload.user_errors,
            )));
        }

        payload
            .segment
            .map(|s| s.id)
            .ok_or_else(|| ShopifyError::NotFound("segmentCreate returned no segment".to_string()))
    }
}
