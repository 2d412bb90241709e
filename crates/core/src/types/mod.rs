//! Core types for the tier-discounts backend.

pub mod collection;
pub mod email;
pub mod gid;
pub mod id;
pub mod percentage;
pub mod scope;

pub use collection::CollectionKind;
pub use email::{Email, EmailError};
pub use id::*;
pub use percentage::{Percentage, PercentageError};
pub use scope::TargetScope;
