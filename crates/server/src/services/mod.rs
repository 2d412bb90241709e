//! Business logic: discount reconciliation and storefront eligibility.

pub mod discount;
pub mod eligibility;

pub use discount::{DiscountError, DiscountOutcome, DiscountService};
pub use eligibility::{CollectionMembership, Eligibility};
