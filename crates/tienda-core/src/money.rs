//! # Money
//!
//! Prices and totals in integer minor units (cents).
//!
//! No floating point anywhere: all arithmetic is checked and overflow is
//! reported as `ShopError::Overflow` instead of wrapping.

use crate::error::ShopError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minor units per major unit.
const CENTS_PER_UNIT: u64 = 100;

/// An amount of money in minor units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Construct from minor units.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Construct from whole major units.
    pub fn from_units(units: u64) -> Result<Self, ShopError> {
        units
            .checked_mul(CENTS_PER_UNIT)
            .map(Self)
            .ok_or(ShopError::Overflow)
    }

    /// Value in minor units.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Self) -> Result<Self, ShopError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(ShopError::Overflow)
    }

    /// Checked multiplication by a quantity.
    pub fn checked_mul(self, quantity: u64) -> Result<Self, ShopError> {
        self.0
            .checked_mul(quantity)
            .map(Self)
            .ok_or(ShopError::Overflow)
    }

    /// Sum an iterator of amounts, failing on overflow.
    pub fn sum<I>(amounts: I) -> Result<Self, ShopError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / CENTS_PER_UNIT,
            self.0 % CENTS_PER_UNIT
        )
    }
}

impl FromStr for Money {
    type Err = ShopError;

    /// Parses `"12"`, `"12.3"` and `"12.34"`. More than two decimals is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ShopError::validation("amount", format!("'{s}' is not a valid amount"));

        let (units, fraction) = match s.split_once('.') {
            Some((u, f)) => (u, f),
            None => (s, ""),
        };
        if units.is_empty() || !units.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if s.ends_with('.') {
            return Err(invalid());
        }

        let units: u64 = units.parse().map_err(|_| invalid())?;
        let cents: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        Self::from_units(units)?.checked_add(Self(cents))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(1205).to_string(), "12.05");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn parse_accepts_common_forms() {
        assert_eq!("12".parse::<Money>().unwrap(), Money::from_cents(1200));
        assert_eq!("12.3".parse::<Money>().unwrap(), Money::from_cents(1230));
        assert_eq!("12.34".parse::<Money>().unwrap(), Money::from_cents(1234));
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", ".5", "12.", "12.345", "-1", "1,50", "abc"] {
            assert!(bad.parse::<Money>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn overflow_is_an_error() {
        let max = Money::from_cents(u64::MAX);
        assert!(matches!(
            max.checked_add(Money::from_cents(1)),
            Err(ShopError::Overflow)
        ));
        assert!(matches!(max.checked_mul(2), Err(ShopError::Overflow)));
    }

    #[test]
    fn sum_of_empty_is_zero() {
        assert_eq!(Money::sum(std::iter::empty()).unwrap(), Money::ZERO);
    }

    proptest! {
        #[test]
        fn display_then_parse_is_identity(cents in 0u64..10_000_000_000) {
            let money = Money::from_cents(cents);
            let parsed: Money = money.to_string().parse().unwrap();
            prop_assert_eq!(parsed, money);
        }

        #[test]
        fn mul_matches_repeated_add(cents in 0u64..1_000_000, qty in 0u64..100) {
            let money = Money::from_cents(cents);
            let repeated = Money::sum(std::iter::repeat_n(money, qty as usize)).unwrap();
            prop_assert_eq!(money.checked_mul(qty).unwrap(), repeated);
        }
    }
}
