//! Shopify global identifier (`gid://`) helpers.
//!
//! The Admin API accepts and returns resource ids in the namespaced
//! `gid://shopify/<Type>/<numeric>` form, while the local database and the
//! storefront channel often carry bare numeric ids. These helpers normalize
//! in both directions so comparisons are done on one canonical form.

/// Scheme prefix shared by every Shopify global identifier.
pub const GID_SCHEME: &str = "gid://";

const PRODUCT_PREFIX: &str = "gid://shopify/Product/";
const COLLECTION_PREFIX: &str = "gid://shopify/Collection/";

/// Whether the id is already in global-identifier form (any resource type).
#[must_use]
pub fn is_gid(id: &str) -> bool {
    id.starts_with(GID_SCHEME)
}

/// Normalize a product id into `gid://shopify/Product/<id>` form.
///
/// Ids already carrying a `gid://` scheme are passed through untouched.
#[must_use]
pub fn product(id: &str) -> String {
    if is_gid(id) {
        id.to_owned()
    } else {
        format!("{PRODUCT_PREFIX}{id}")
    }
}

/// Normalize a collection id into `gid://shopify/Collection/<id>` form.
#[must_use]
pub fn collection(id: &str) -> String {
    if is_gid(id) {
        id.to_owned()
    } else {
        format!("{COLLECTION_PREFIX}{id}")
    }
}

/// Strip the product namespace, yielding the bare id.
///
/// Non-product gids and bare ids are returned unchanged, so two product ids
/// compare equal after normalization regardless of which form each arrived in.
#[must_use]
pub fn product_numeric(id: &str) -> &str {
    id.strip_prefix(PRODUCT_PREFIX).unwrap_or(id)
}
