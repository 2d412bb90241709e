//! Collection kind tag.

use serde::{Deserialize, Serialize};

/// Shopify collection flavor.
///
/// Custom collections have a manually curated product list; smart collections
/// are rule-driven. Membership lookups report the kind so callers can tell
/// whether a product's inclusion is curated or derived from rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Manually curated product list.
    Custom,
    /// Rule-driven membership.
    Smart,
}

impl CollectionKind {
    /// The stored column value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Smart => "smart",
        }
    }

    /// Parse a stored column value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "custom" => Some(Self::Custom),
            "smart" => Some(Self::Smart),
            _ => None,
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for kind in [CollectionKind::Custom, CollectionKind::Smart] {
            assert_eq!(CollectionKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(CollectionKind::parse("automated"), None);
    }
}
