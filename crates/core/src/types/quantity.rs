//! Line item quantities.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// A positive item quantity (`>= 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity, returning `None` for zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Interpret a caller-supplied integer; anything below one is rejected.
    #[must_use]
    pub fn from_requested(value: i64) -> Option<Self> {
        u32::try_from(value).ok().and_then(Self::new)
    }

    /// The underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit, saturating at `u32::MAX`.
    #[must_use]
    pub const fn increment(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_negative_rejected() {
        assert!(Quantity::new(0).is_none());
        assert!(Quantity::from_requested(0).is_none());
        assert!(Quantity::from_requested(-4).is_none());
        assert_eq!(Quantity::from_requested(3).map(Quantity::get), Some(3));
    }

    #[test]
    fn test_increment_saturates() {
        let max = Quantity::new(u32::MAX);
        assert_eq!(max.map(Quantity::increment), max);
        assert_eq!(Quantity::ONE.increment().get(), 2);
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("2").ok().map(Quantity::get), Some(2));
    }
}
