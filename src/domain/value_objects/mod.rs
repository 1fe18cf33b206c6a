//! Value objects for the cart domain.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use crate::{Error, Result};

/// Money value object.
///
/// A fixed-precision decimal with two fraction digits, so price arithmetic
/// never drifts the way binary floats do. Rounding is half-up and happens
/// once, at the point a subtotal is produced; sums of already-rounded
/// values are never rounded again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Builds a value from minor units: `from_minor(311)` is 3.11.
    pub fn from_minor(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Rounds half-up to two fraction digits.
    pub fn round2(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// `self * qty`, rounded to two fraction digits.
    pub fn times(self, qty: u32) -> Self {
        Self(self.0 * Decimal::from(qty)).round2()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Quantity value object: a non-negative whole number of units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    /// Accepts any non-negative value. Negative input is a contract
    /// violation reported as [`Error::InvalidQuantity`], never clamped.
    pub fn new(value: i64) -> Result<Self> {
        u32::try_from(value)
            .map(Self)
            .map_err(|_| Error::InvalidQuantity(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn add(&self, other: Quantity) -> Quantity {
        Self(self.0.saturating_add(other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
