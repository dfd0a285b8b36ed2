//! Monetary amounts in minor currency units.
//!
//! Amounts are whole paise held in an `i64`; arithmetic is checked so an
//! overflow surfaces as an error instead of wrapping silently.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Error;

/// Amount of money in minor units (paise).
///
/// # Examples
/// ```
/// use backend::domain::Money;
///
/// let unit = Money::from_minor(1_250);
/// let line = unit.times(4).expect("no overflow");
/// assert_eq!(line.minor(), 5_000);
/// assert_eq!(line.to_string(), "50.00");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    ToSchema,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw count of minor units.
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Raw count of minor units.
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// `true` when the amount is below zero.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Multiply a unit price by a quantity.
    pub fn times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }

    /// Sum amounts, failing on overflow.
    pub fn try_sum(amounts: impl IntoIterator<Item = Self>) -> Result<Self, Error> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
            .ok_or_else(overflow)
    }

    /// Addition that maps overflow to an internal error.
    pub fn try_add(self, other: Self) -> Result<Self, Error> {
        self.checked_add(other).ok_or_else(overflow)
    }

    /// Subtraction that maps overflow to an internal error.
    pub fn try_sub(self, other: Self) -> Result<Self, Error> {
        self.checked_sub(other).ok_or_else(overflow)
    }

    /// Multiplication by a quantity that maps overflow to an internal error.
    pub fn try_mul(self, quantity: u32) -> Result<Self, Error> {
        self.times(quantity).ok_or_else(overflow)
    }
}

fn overflow() -> Error {
    Error::internal("monetary amount overflow")
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0.00")]
    #[case(5, "0.05")]
    #[case(123_456, "1234.56")]
    #[case(-250, "-2.50")]
    fn displays_major_and_minor_units(#[case] minor: i64, #[case] expected: &str) {
        assert_eq!(Money::from_minor(minor).to_string(), expected);
    }

    #[rstest]
    fn try_sum_reports_overflow() {
        let result = Money::try_sum([Money::from_minor(i64::MAX), Money::from_minor(1)]);
        assert!(result.is_err());
    }

    #[rstest]
    fn try_sum_adds_all_amounts() {
        let total = Money::try_sum([100, 250, 5].map(Money::from_minor)).expect("sum");
        assert_eq!(total, Money::from_minor(355));
    }
}
