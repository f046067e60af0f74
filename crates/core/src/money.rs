//! Exact currency amounts in integer minor units (cents).
//!
//! Decimal notation only exists at the boundary: parsing from `rust_decimal::Decimal`
//! and rendering back to a two-digit decimal string.

use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};

/// Minor units per major unit.
const SCALE: u32 = 2;

/// Largest magnitude accepted at the boundary (100 billion in major units). Ledger sums
/// stay well inside `i64`.
const MAX_ABS_CENTS: i64 = 10_000_000_000_000;

/// A signed amount of money in cents.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Clamp negative amounts to zero.
    pub fn max_zero(self) -> Self {
        Self(self.0.max(0))
    }

    /// Convert an exact decimal into cents.
    ///
    /// Amounts with more than two significant fractional digits are rejected rather
    /// than rounded.
    pub fn from_decimal(value: Decimal) -> DomainResult<Self> {
        let normalized = value.normalize();
        let scale = normalized.scale();
        if scale > SCALE {
            return Err(DomainError::validation(format!(
                "amount {value} has more than {SCALE} decimal places"
            )));
        }

        let cents = normalized
            .mantissa()
            .checked_mul(10i128.pow(SCALE - scale))
            .filter(|c| c.unsigned_abs() <= MAX_ABS_CENTS as u128)
            .and_then(|c| i64::try_from(c).ok())
            .ok_or_else(|| DomainError::validation(format!("amount {value} is out of range")))?;

        Ok(Self(cents))
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, SCALE)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.to_decimal(), f)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::validation(format!("invalid amount '{s}': {e}")))?;
        Self::from_decimal(value)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> core::iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

// Wire format: a decimal string with exactly two fractional digits ("33.34").
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal().to_string())
    }
}

// Accepts anything `Decimal` accepts (strings and JSON numbers).
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::from_decimal(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_strings_into_cents() {
        assert_eq!("100.00".parse::<Money>().unwrap(), Money::from_cents(10_000));
        assert_eq!("33.3".parse::<Money>().unwrap(), Money::from_cents(3_330));
        assert_eq!("7".parse::<Money>().unwrap(), Money::from_cents(700));
        assert_eq!("-0.01".parse::<Money>().unwrap(), Money::from_cents(-1));
        // Trailing zeros beyond the second digit are not extra precision.
        assert_eq!("1.2300".parse::<Money>().unwrap(), Money::from_cents(123));
    }

    #[test]
    fn rejects_sub_cent_precision() {
        let err = "10.005".parse::<Money>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_amounts_beyond_the_cap() {
        assert_eq!(
            "100000000000.00".parse::<Money>().unwrap(),
            Money::from_cents(MAX_ABS_CENTS)
        );
        assert_eq!(
            "-100000000000".parse::<Money>().unwrap(),
            Money::from_cents(-MAX_ABS_CENTS)
        );

        for raw in ["100000000000.01", "92233720368547758.07", "-100000000000.01"] {
            let err = raw.parse::<Money>().unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{raw}");
        }

        let from_json = serde_json::from_str::<Money>("\"92233720368547758.07\"");
        assert!(from_json.is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!("ten".parse::<Money>().is_err());
    }

    #[test]
    fn displays_two_fraction_digits() {
        assert_eq!(Money::from_cents(3_334).to_string(), "33.34");
        assert_eq!(Money::from_cents(-3_333).to_string(), "-33.33");
        assert_eq!(Money::ZERO.to_string(), "0.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn json_accepts_strings_and_numbers() {
        let from_str: Money = serde_json::from_str("\"66.67\"").unwrap();
        let from_int: Money = serde_json::from_str("100").unwrap();
        assert_eq!(from_str, Money::from_cents(6_667));
        assert_eq!(from_int, Money::from_cents(10_000));
        assert_eq!(serde_json::to_string(&from_str).unwrap(), "\"66.67\"");
    }

    #[test]
    fn sum_and_sign_helpers() {
        let total: Money = [Money::from_cents(5), Money::from_cents(-7)].iter().sum();
        assert_eq!(total, Money::from_cents(-2));
        assert!(total.is_negative());
        assert_eq!(total.max_zero(), Money::ZERO);
        assert_eq!(-total, Money::from_cents(2));
    }
}
