//! Lossless currency amount backed by rust_decimal.
//!
//! Provides canonical parsing from strings and formatting without exponent notation.

use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lossless currency amount for goal, prize, and income arithmetic.
///
/// Backed by rust_decimal to avoid floating-point drift.
/// Serializes to JSON number (not string) by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Money {
    /// Create a Money from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Money(value)
    }

    /// Parse a Money from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Money)
    }

    /// Format the amount as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        // Use normalize() to remove trailing zeros, then format without exponent
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Money(RustDecimal::ZERO)
    }

    /// Returns true if the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the amount is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Returns the value 100.
    pub fn hundred() -> Self {
        Money(RustDecimal::ONE_HUNDRED)
    }

    /// One cent, the smallest currency unit handled by payouts.
    pub fn cent() -> Self {
        Money(RustDecimal::new(1, 2))
    }

    /// Truncate toward zero to whole cents.
    pub fn floor_cents(&self) -> Self {
        Money(self.0.round_dp_with_strategy(2, RoundingStrategy::ToZero))
    }

    /// Round half-up to two decimal places, for display percentages.
    pub fn round_2dp(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                .normalize(),
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Money {
    fn from(value: RustDecimal) -> Self {
        Money(value)
    }
}

impl From<Money> for RustDecimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Money(RustDecimal::from(value))
    }
}

// Arithmetic operations
impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Money {
    type Output = Money;

    fn mul(self, rhs: Money) -> Money {
        Money(self.0 * rhs.0)
    }
}

impl std::ops::Div for Money {
    type Output = Money;

    fn div(self, rhs: Money) -> Money {
        Money(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}
