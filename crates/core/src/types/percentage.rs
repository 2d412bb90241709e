//! Validated discount percentage.

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Percentage`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PercentageError {
    /// Value is not a finite number.
    #[error("percentage must be a finite number")]
    NotFinite,
    /// Value falls outside the inclusive 0-100 range.
    #[error("percentage must be between 0 and 100 (got {0})")]
    OutOfRange(f64),
}

/// A discount percentage in the inclusive range 0-100.
///
/// Zero means "no discount": [`Percentage::is_active`] is the single place
/// that decides whether a stored value grants anything at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Percentage {
    /// Construct a validated percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PercentageError`] if the value is NaN/infinite or outside
    /// the inclusive 0-100 range.
    pub fn new(value: f64) -> Result<Self, PercentageError> {
        if !value.is_finite() {
            return Err(PercentageError::NotFinite);
        }
        if !(0.0..=100.0).contains(&value) {
            return Err(PercentageError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// The raw percentage value (e.g. `12.5`).
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.0
    }

    /// The value as a decimal fraction (e.g. `0.125`), the form the Admin
    /// API's `customerGets.value.percentage` field expects.
    #[must_use]
    pub const fn fraction(&self) -> f64 {
        self.0 / 100.0
    }

    /// Whether the percentage grants a discount at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.0 > 0.0
    }
}

impl std::fmt::Display for Percentage {
    /// Renders `10.0` as `10` and `12.5` as `12.5`, matching the tag and
    /// title naming the rest of the system derives from the value.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range() {
        assert!(Percentage::new(0.0).is_ok());
        assert!(Percentage::new(100.0).is_ok());
        assert!(Percentage::new(12.5).is_ok());
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            Percentage::new(-1.0),
            Err(PercentageError::OutOfRange(_))
        ));
        assert!(matches!(
            Percentage::new(100.01),
            Err(PercentageError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_not_finite() {
        assert_eq!(Percentage::new(f64::NAN), Err(PercentageError::NotFinite));
        assert_eq!(
            Percentage::new(f64::INFINITY),
            Err(PercentageError::NotFinite)
        );
    }

    #[test]
    fn test_zero_is_inactive() {
        let p = Percentage::new(0.0).expect("valid");
        assert!(!p.is_active());
    }

    #[test]
    fn test_fraction() {
        let p = Percentage::new(15.0).expect("valid");
        assert!((p.fraction() - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_trims_integer_values() {
        assert_eq!(Percentage::new(10.0).expect("valid").to_string(), "10");
        assert_eq!(Percentage::new(12.5).expect("valid").to_string(), "12.5");
    }
}
