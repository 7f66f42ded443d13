// 💵 Money - two-decimal fixed point amounts
//
// Amounts arrive as f64 and are checked with a tolerance, because literals
// like 10.50 have no exact binary representation. Once accepted they are held
// as whole cents so balance arithmetic is exact.

use crate::error::ParseMoneyError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Cents per whole currency unit
pub const CENTS_PER_UNIT: u64 = 100;

const SCALE: f64 = CENTS_PER_UNIT as f64;

/// Max distance between `amount * 100` and its nearest integer
pub const TOLERANCE: f64 = 1e-9;

// ============================================================================
// AMOUNT VALIDATION
// ============================================================================

/// True iff `amount` is non-negative and has at most two significant
/// fractional digits.
///
/// `-0.0` is accepted. NaN and infinities are rejected.
pub fn is_amount_valid(amount: f64) -> bool {
    if amount < 0.0 {
        return false;
    }

    let scaled = amount * SCALE;
    (scaled - scaled.round()).abs() < TOLERANCE
}

// ============================================================================
// MONEY
// ============================================================================

/// Non-negative amount in whole cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Money(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Convert a validated f64 amount into cents.
    ///
    /// Returns `None` when `is_amount_valid` rejects the amount or when it is
    /// too large to be held in cents.
    pub fn try_from_f64(amount: f64) -> Option<Self> {
        if !is_amount_valid(amount) {
            return None;
        }

        let cents = (amount * SCALE).round();
        // u64::MAX as f64 rounds up to 2^64, so >= keeps the cast in range
        if cents >= u64::MAX as f64 {
            return None;
        }

        Some(Money(cents as u64))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
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

/// Parses `"12"`, `"12.5"` and `"12.50"`. Signs, exponents, a bare trailing
/// `.` and more than two fractional digits are rejected.
impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoneyError {
            input: s.to_string(),
        };

        let (whole, fraction) = match s.split_once('.') {
            Some((_, "")) => return Err(err()),
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || fraction.len() > 2 || !all_digits(whole) || !all_digits(fraction) {
            return Err(err());
        }

        let units: u64 = whole.parse().map_err(|_| err())?;
        let cents: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| err())? * 10,
            _ => fraction.parse().map_err(|_| err())?,
        };

        units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|c| c.checked_add(cents))
            .map(Money)
            .ok_or_else(err)
    }
}

/// Serialized as a decimal number (`12.5`), the shape callers see from
/// `Account::balance`.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_amounts_are_invalid() {
        assert!(!is_amount_valid(-0.01));
        assert!(!is_amount_valid(-10.50));
        assert!(!is_amount_valid(-50.0));
    }

    #[test]
    fn test_two_decimal_amounts_are_valid() {
        assert!(is_amount_valid(0.0));
        assert!(is_amount_valid(-0.0));
        assert!(is_amount_valid(10.0));
        assert!(is_amount_valid(10.5));
        assert!(is_amount_valid(10.50));
        assert!(is_amount_valid(150.75));
        assert!(is_amount_valid(0.01));
    }

    #[test]
    fn test_three_or_more_decimals_are_invalid() {
        assert!(!is_amount_valid(0.001));
        assert!(!is_amount_valid(1.23456));
        assert!(!is_amount_valid(10.999));
        assert!(!is_amount_valid(100.001));
    }

    #[test]
    fn test_non_finite_amounts_are_invalid() {
        assert!(!is_amount_valid(f64::NAN));
        assert!(!is_amount_valid(f64::INFINITY));
        assert!(!is_amount_valid(f64::NEG_INFINITY));
    }

    #[test]
    fn test_try_from_f64_rounds_to_cents() {
        assert_eq!(Money::try_from_f64(10.50), Some(Money::from_cents(1050)));
        assert_eq!(Money::try_from_f64(0.29), Some(Money::from_cents(29)));
        assert_eq!(Money::try_from_f64(-0.0), Some(Money::ZERO));
        assert_eq!(Money::try_from_f64(100.001), None);
        assert_eq!(Money::try_from_f64(-1.0), None);
    }

    #[test]
    fn test_try_from_f64_rejects_unrepresentable() {
        assert_eq!(Money::try_from_f64(1e300), None);
        assert!(is_amount_valid(1e300));
    }

    #[test]
    fn test_display_always_has_two_digits() {
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(1050).to_string(), "10.50");
        assert_eq!(Money::from_cents(20000).to_string(), "200.00");
    }

    #[test]
    fn test_parse_accepts_up_to_two_digits() {
        assert_eq!("7".parse::<Money>(), Ok(Money::from_cents(700)));
        assert_eq!("10.5".parse::<Money>(), Ok(Money::from_cents(1050)));
        assert_eq!("10.50".parse::<Money>(), Ok(Money::from_cents(1050)));
        assert_eq!("0.01".parse::<Money>(), Ok(Money::from_cents(1)));
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        for input in ["", "-1", "1.234", "abc", "1.", ".5", "1.2.3", "+1", "1e3", " 1"] {
            assert!(input.parse::<Money>().is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_cents(100);
        let b = Money::from_cents(30);
        assert_eq!(a.checked_sub(b), Some(Money::from_cents(70)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(Money::from_cents(u64::MAX).checked_add(b), None);
    }

    #[test]
    fn test_serializes_as_decimal_number() {
        let json = serde_json::to_string(&Money::from_cents(1250)).unwrap();
        assert_eq!(json, "12.5");
    }
}
