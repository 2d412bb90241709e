//! Storefront eligibility evaluation.
//!
//! Answers "does this customer get a discount on this product" for the App
//! Proxy channel. The storefront renders a price hint from the answer, so
//! this path must never error towards granting: every failure, unknown
//! configuration, or lookup problem yields `{percent: 0, eligible: false}`.

use std::future::Future;

use serde::Serialize;

use tier_discounts_core::{Percentage, TargetScope, gid};

use crate::shopify::{AdminClient, CollectionRef, ShopifyError};

/// Collection membership lookup, faked in tests.
pub trait CollectionMembership {
    /// Collections the product belongs to.
    fn collections_for_product(
        &self,
        product_id: &str,
    ) -> impl Future<Output = Result<Vec<CollectionRef>, ShopifyError>> + Send;
}

impl CollectionMembership for AdminClient {
    async fn collections_for_product(
        &self,
        product_id: &str,
    ) -> Result<Vec<CollectionRef>, ShopifyError> {
        self.product_collections(product_id).await
    }
}

/// Membership source used when no Shopify session is available. Every
/// lookup fails, so collection-scoped checks deny.
pub struct NoMembership;

impl CollectionMembership for NoMembership {
    async fn collections_for_product(
        &self,
        _product_id: &str,
    ) -> Result<Vec<CollectionRef>, ShopifyError> {
        Err(ShopifyError::NoSession(String::new()))
    }
}

/// The eligibility answer sent to the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Eligibility {
    /// Discount percentage (0-100); zero when not eligible.
    pub percent: f64,
    pub eligible: bool,
}

impl Eligibility {
    /// The fail-closed answer.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            percent: 0.0,
            eligible: false,
        }
    }

    const fn granted(percent: f64) -> Self {
        Self {
            percent,
            eligible: true,
        }
    }
}

/// Evaluate eligibility of a product against a customer's discount
/// configuration.
///
/// `scope` is `None` when the stored target type is unrecognized, which
/// fails closed like everything else on this path.
pub async fn evaluate<M: CollectionMembership>(
    product_id: &str,
    percentage: Percentage,
    scope: Option<&TargetScope>,
    membership: &M,
) -> Eligibility {
    if !percentage.is_active() {
        return Eligibility::none();
    }

    let Some(scope) = scope else {
        return Eligibility::none();
    };

    match scope {
        TargetScope::All => Eligibility::granted(percentage.value()),
        TargetScope::Products(ids) => {
            let wanted = gid::product_numeric(product_id);
            let matched = ids.iter().any(|id| gid::product_numeric(id) == wanted);
            if matched {
                Eligibility::granted(percentage.value())
            } else {
                Eligibility::none()
            }
        }
        TargetScope::Collections(ids) => {
            let memberships = match membership.collections_for_product(product_id).await {
                Ok(memberships) => memberships,
                Err(err) => {
                    tracing::warn!(
                        product_id = %product_id,
                        error = %err,
                        "collection membership lookup failed, denying eligibility"
                    );
                    return Eligibility::none();
                }
            };

            let targets: Vec<String> = ids.iter().map(|id| gid::collection(id)).collect();
            let matched = memberships.iter().any(|c| targets.contains(&c.id));
            if matched {
                Eligibility::granted(percentage.value())
            } else {
                Eligibility::none()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use tier_discounts_core::CollectionKind;

    use super::*;

    fn pct(value: f64) -> Percentage {
        Percentage::new(value).unwrap()
    }

    /// Fake membership source; `None` simulates a lookup failure.
    struct FakeMembership {
        collections: Mutex<Option<Vec<CollectionRef>>>,
    }

    impl FakeMembership {
        fn with(ids: &[&str]) -> Self {
            Self {
                collections: Mutex::new(Some(
                    ids.iter()
                        .map(|id| CollectionRef {
                            id: gid::collection(id),
                            kind: CollectionKind::Custom,
                        })
                        .collect(),
                )),
            }
        }

        fn failing() -> Self {
            Self {
                collections: Mutex::new(None),
            }
        }
    }

    impl CollectionMembership for FakeMembership {
        async fn collections_for_product(
            &self,
            _product_id: &str,
        ) -> Result<Vec<CollectionRef>, ShopifyError> {
            self.collections
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ShopifyError::RateLimited(30))
        }
    }

    #[tokio::test]
    async fn test_zero_percentage_denies_every_target_type() {
        let membership = FakeMembership::with(&["1"]);

        for scope in [
            TargetScope::All,
            TargetScope::Products(vec!["123".to_string()]),
            TargetScope::Collections(vec!["1".to_string()]),
        ] {
            let result = evaluate("123", pct(0.0), Some(&scope), &membership).await;
            assert_eq!(result, Eligibility::none());
        }
    }

    #[tokio::test]
    async fn test_all_scope_grants_any_product_id() {
        let membership = FakeMembership::with(&[]);

        for product_id in ["123", "gid://shopify/Product/123", "not-even-an-id"] {
            let result = evaluate(product_id, pct(15.0), Some(&TargetScope::All), &membership).await;
            assert_eq!(result, Eligibility::granted(15.0));
        }
    }

    #[tokio::test]
    async fn test_products_scope_compares_after_normalization() {
        let membership = FakeMembership::with(&[]);
        let scope = TargetScope::Products(vec!["gid://shopify/Product/555".to_string()]);

        let bare = evaluate("555", pct(10.0), Some(&scope), &membership).await;
        assert!(bare.eligible);

        let prefixed = evaluate("gid://shopify/Product/555", pct(10.0), Some(&scope), &membership).await;
        assert!(prefixed.eligible);

        let absent = evaluate("556", pct(10.0), Some(&scope), &membership).await;
        assert_eq!(absent, Eligibility::none());
    }

    #[tokio::test]
    async fn test_collections_scope_intersects_membership() {
        let scope = TargetScope::Collections(vec!["9".to_string(), "10".to_string()]);

        let inside = FakeMembership::with(&["10", "42"]);
        let result = evaluate("123", pct(10.0), Some(&scope), &inside).await;
        assert_eq!(result, Eligibility::granted(10.0));

        let outside = FakeMembership::with(&["42"]);
        let result = evaluate("123", pct(10.0), Some(&scope), &outside).await;
        assert_eq!(result, Eligibility::none());

        let empty = FakeMembership::with(&[]);
        let result = evaluate("123", pct(10.0), Some(&scope), &empty).await;
        assert_eq!(result, Eligibility::none());
    }

    #[tokio::test]
    async fn test_membership_lookup_failure_fails_closed() {
        let scope = TargetScope::Collections(vec!["9".to_string()]);
        let membership = FakeMembership::failing();

        let result = evaluate("123", pct(10.0), Some(&scope), &membership).await;
        assert_eq!(result, Eligibility::none());
    }

    #[tokio::test]
    async fn test_unknown_target_type_fails_closed() {
        let membership = FakeMembership::with(&["1"]);
        let result = evaluate("123", pct(10.0), None, &membership).await;
        assert_eq!(result, Eligibility::none());
    }

    #[tokio::test]
    async fn test_nonzero_percent_never_paired_with_ineligible() {
        let membership = FakeMembership::with(&[]);
        let scope = TargetScope::Products(vec!["1".to_string()]);

        let result = evaluate("2", pct(50.0), Some(&scope), &membership).await;
        assert!(!result.eligible);
        assert!((result.percent - 0.0).abs() < f64::EPSILON);
    }
}
