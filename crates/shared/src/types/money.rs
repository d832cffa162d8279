//! Money type with decimal precision.
//!
//! NDIS prices are quoted and claimed in Australian dollars to the cent.
//! Never use floating-point for money calculations.

use std::iter::Sum;
use std::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount in Australian dollars, always held at two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount, rounding half away from zero to whole cents.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(round_cents(amount))
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiplies a unit price by a quantity (hours, units), rounding to cents.
    #[must_use]
    pub fn times(&self, quantity: Decimal) -> Self {
        Self::new(self.0 * quantity)
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_rounds_to_cents() {
        assert_eq!(Money::new(dec!(10.005)).amount(), dec!(10.01));
        assert_eq!(Money::new(dec!(10.004)).amount(), dec!(10.00));
        assert_eq!(Money::new(dec!(-10.005)).amount(), dec!(-10.01));
    }

    #[test]
    fn test_times_hours() {
        let rate = Money::new(dec!(67.56));
        assert_eq!(rate.times(dec!(8)).amount(), dec!(540.48));
        assert_eq!(rate.times(dec!(2.33)).amount(), dec!(157.41));
    }

    #[test]
    fn test_sum() {
        let total: Money = [dec!(1.10), dec!(2.20), dec!(3.30)]
            .into_iter()
            .map(Money::new)
            .sum();
        assert_eq!(total.amount(), dec!(6.60));
    }

    #[test]
    fn test_zero_and_negative() {
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_negative());
        assert!(Money::new(dec!(-0.01)).is_negative());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(dec!(540.4)).to_string(), "$540.40");
    }
}
