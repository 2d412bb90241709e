//! Customer tag synchronization.
//!
//! Shopify stores customer tags as one comma-separated string. The discount
//! pipeline owns three tags per customer (membership, storefront display,
//! segment marker) and must replace stale copies of its own tags while
//! leaving every other tag exactly as the merchant wrote it.

use tier_discounts_core::{CustomerId, Percentage};

/// Prefix of the membership tag this service manages.
const MEMBER_TAG_PREFIX: &str = "MemberDiscount_";
/// Prefix of the storefront display tag this service manages.
const DISPLAY_TAG_PREFIX: &str = "special_discount_";

/// Membership tag for a percentage, with `.` mapped to `_` so the tag stays
/// a single token (e.g. `MemberDiscount_12_5`).
#[must_use]
pub fn member_tag(percentage: Percentage) -> String {
    format!("{MEMBER_TAG_PREFIX}{}", percentage.to_string().replace('.', "_"))
}

/// Storefront display tag (e.g. `special_discount_12.5%`).
#[must_use]
pub fn display_tag(percentage: Percentage) -> String {
    format!("{DISPLAY_TAG_PREFIX}{percentage}%")
}

/// Segment marker tag derived from the local customer id. The customer
/// segment matches on this tag, so it must be stable across renames and
/// percentage changes.
#[must_use]
pub fn marker_tag(customer_id: CustomerId) -> String {
    format!("SegmentTarget_{customer_id}")
}

/// Merge the managed discount tags into an existing remote tag string.
///
/// Splits on commas, trims, drops empties and stale managed tags (any token
/// starting with the membership or display prefix), then appends the current
/// managed tags. First-seen order is preserved and duplicates are dropped,
/// so applying the result again is a fixed point.
#[must_use]
pub fn synchronize_tags(existing: &str, percentage: Percentage, customer_id: CustomerId) -> String {
    let mut tags: Vec<String> = existing
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| !tag.starts_with(MEMBER_TAG_PREFIX) && !tag.starts_with(DISPLAY_TAG_PREFIX))
        .map(str::to_owned)
        .collect();

    tags.push(member_tag(percentage));
    tags.push(display_tag(percentage));
    tags.push(marker_tag(customer_id));

    let mut seen = std::collections::HashSet::new();
    tags.retain(|tag| seen.insert(tag.clone()));

    tags.join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pct(value: f64) -> Percentage {
        Percentage::new(value).unwrap()
    }

    #[test]
    fn test_managed_tag_rendering() {
        assert_eq!(member_tag(pct(10.0)), "MemberDiscount_10");
        assert_eq!(member_tag(pct(12.5)), "MemberDiscount_12_5");
        assert_eq!(display_tag(pct(12.5)), "special_discount_12.5%");
        assert_eq!(marker_tag(CustomerId::new(7)), "SegmentTarget_7");
    }

    #[test]
    fn test_adds_managed_tags_to_empty_string() {
        let result = synchronize_tags("", pct(10.0), CustomerId::new(7));
        assert_eq!(
            result,
            "MemberDiscount_10, special_discount_10%, SegmentTarget_7"
        );
    }

    #[test]
    fn test_preserves_unrelated_tags_verbatim() {
        let result = synchronize_tags("VIP, wholesale", pct(10.0), CustomerId::new(7));
        assert_eq!(
            result,
            "VIP, wholesale, MemberDiscount_10, special_discount_10%, SegmentTarget_7"
        );
    }

    #[test]
    fn test_replaces_stale_managed_tags() {
        let existing = "MemberDiscount_5, VIP, special_discount_5%, SegmentTarget_7";
        let result = synchronize_tags(existing, pct(15.0), CustomerId::new(7));
        assert_eq!(
            result,
            "VIP, SegmentTarget_7, MemberDiscount_15, special_discount_15%"
        );
    }

    #[test]
    fn test_is_a_fixed_point() {
        let once = synchronize_tags("VIP, new", pct(12.5), CustomerId::new(3));
        let twice = synchronize_tags(&once, pct(12.5), CustomerId::new(3));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_trims_and_drops_empty_segments() {
        let result = synchronize_tags("  VIP ,, ,wholesale ", pct(10.0), CustomerId::new(1));
        assert!(result.starts_with("VIP, wholesale, "));
    }

    #[test]
    fn test_exactly_one_of_each_managed_tag() {
        let existing = "MemberDiscount_5, MemberDiscount_20, special_discount_5%, special_discount_20%";
        let result = synchronize_tags(existing, pct(10.0), CustomerId::new(2));

        let member_count = result.matches("MemberDiscount_").count();
        let display_count = result.matches("special_discount_").count();
        let marker_count = result.matches("SegmentTarget_").count();
        assert_eq!(member_count, 1);
        assert_eq!(display_count, 1);
        assert_eq!(marker_count, 1);
    }
}
