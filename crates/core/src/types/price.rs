//! Type-safe price representation using decimal arithmetic.
//!
//! A [`Price`] is a non-negative amount in the currency's standard unit
//! (dollars, not cents). Arithmetic saturates instead of panicking so that the
//! cart's derived total can always be computed.

use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::quantity::Quantity;

/// Errors produced when constructing a price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    /// Create a price from an amount in the smallest currency unit (cents).
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// Create a price from a floating point amount, as stored by document
    /// databases that have no decimal type.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite or is negative.
    pub fn from_f64(amount: f64) -> Result<Self, PriceError> {
        let decimal =
            Decimal::try_from(amount).map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(decimal.normalize())
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity.get())))
    }

    /// Amount in the smallest currency unit (e.g. cents), rounded half away
    /// from zero. Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(&self) -> Option<i64> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn format(&self, currency: CurrencyCode) -> String {
        format!("{}{:.2}", currency.symbol(), self.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Lowercase code as expected by Stripe.
    #[must_use]
    pub const fn stripe_code(&self) -> &'static str {
        match self {
            Self::USD => "usd",
            Self::EUR => "eur",
            Self::GBP => "gbp",
            Self::CAD => "cad",
            Self::AUD => "aud",
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            other => Err(PriceError::Invalid(format!("unsupported currency: {other}"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_price_rejected() {
        let result = Price::new(Decimal::new(-1, 0));
        assert!(matches!(result, Err(PriceError::Negative(_))));
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let price = Price::new(Decimal::new(-0, 2)).unwrap();
        assert_eq!(price, Price::ZERO);
    }

    #[test]
    fn test_times_and_sum() {
        let vase = Price::from_units(25).times(Quantity::new(3).unwrap());
        let lamp = Price::from_units(40).times(Quantity::ONE);
        let total: Price = [vase, lamp].into_iter().sum();
        assert_eq!(total, Price::from_units(115));
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Price::new(Decimal::MAX).unwrap();
        assert_eq!(max.times(Quantity::new(2).unwrap()), max);
        assert_eq!(max + Price::from_units(1), max);
        assert_eq!(max.to_minor_units(), None);
    }

    #[test]
    fn test_minor_units_rounding() {
        assert_eq!(Price::from_cents(1999).to_minor_units(), Some(1999));
        assert_eq!("0.125".parse::<Price>().unwrap().to_minor_units(), Some(13));
        assert_eq!(Price::from_units(40).to_minor_units(), Some(4000));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Price::from_f64(19.99).unwrap(), Price::from_cents(1999));
        assert!(Price::from_f64(-5.0).is_err());
        assert!(Price::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(Price::from_units(115).format(CurrencyCode::USD), "$115.00");
        assert_eq!(Price::from_cents(1999).format(CurrencyCode::GBP), "£19.99");
    }

    #[test]
    fn test_serde_rejects_negative() {
        let result: Result<Price, _> = serde_json::from_str("\"-3.50\"");
        assert!(result.is_err());
        let price: Price = serde_json::from_str("\"3.50\"").unwrap();
        assert_eq!(price, Price::from_cents(350));
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("usd".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert_eq!(" Eur ".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert!("xyz".parse::<CurrencyCode>().is_err());
    }
}
