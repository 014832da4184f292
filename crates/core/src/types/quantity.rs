//! Strictly positive item quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity must be a positive integer, got {0}")]
    NotPositive(i64),
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// A quantity of units, always at least one.
///
/// Request bodies carry quantities as plain integers; converting them into a
/// `Quantity` happens before any store interaction so a zero or negative
/// amount can never reach a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// Validate a raw quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is zero, negative, or does not fit the
    /// storage column (`INTEGER`).
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value <= 0 {
            return Err(QuantityError::NotPositive(value));
        }
        i32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::TooLarge(value))
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_is_accepted() {
        assert_eq!(Quantity::new(3).unwrap().get(), 3);
    }

    #[test]
    fn test_zero_and_negative_are_rejected() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive(0)));
        assert_eq!(Quantity::new(-4), Err(QuantityError::NotPositive(-4)));
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert!(matches!(
            Quantity::new(i64::from(i32::MAX) + 1),
            Err(QuantityError::TooLarge(_))
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Quantity>("5").is_ok());
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert!(serde_json::from_str::<Quantity>("-1").is_err());
    }
}
