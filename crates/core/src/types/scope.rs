//! Discount target scope.

use serde::{Deserialize, Serialize};

/// What a customer's discount applies to.
///
/// Stored in the database as a `(target_type, target_ids)` pair; the ids are
/// opaque product or collection identifiers (bare numeric or `gid://` form)
/// and are meaningless for [`TargetScope::All`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target_type", content = "target_ids", rename_all = "lowercase")]
pub enum TargetScope {
    /// Every product in the store.
    All,
    /// Only the listed products.
    Products(Vec<String>),
    /// Only products belonging to at least one of the listed collections.
    Collections(Vec<String>),
}

impl TargetScope {
    /// Build a scope from the stored column pair.
    ///
    /// Returns `None` for an unrecognized target type; callers decide whether
    /// that is a validation error (operator input) or fail-closed (storefront
    /// eligibility).
    #[must_use]
    pub fn from_parts(target_type: &str, ids: Vec<String>) -> Option<Self> {
        match target_type {
            "all" => Some(Self::All),
            "products" => Some(Self::Products(ids)),
            "collections" => Some(Self::Collections(ids)),
            _ => None,
        }
    }

    /// The stored `target_type` column value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Products(_) => "products",
            Self::Collections(_) => "collections",
        }
    }

    /// The stored `target_ids` column value ([] for [`TargetScope::All`]).
    #[must_use]
    pub fn ids(&self) -> &[String] {
        match self {
            Self::All => &[],
            Self::Products(ids) | Self::Collections(ids) => ids,
        }
    }
}
