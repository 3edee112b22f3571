//! Money rounding and currency codes.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` persisted with two fraction digits.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fraction digits kept on every persisted monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to two fraction digits, half-up.
///
/// The result always carries exactly two fraction digits, so `0` comes back
/// as `0.00`.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

/// Clamps negative amounts to zero.
#[must_use]
pub fn floor_at_zero(amount: Decimal) -> Decimal {
    amount.max(Decimal::ZERO)
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    #[default]
    Usd,
    /// Indonesian Rupiah
    Idr,
    /// Euro
    Eur,
    /// Singapore Dollar
    Sgd,
    /// Japanese Yen
    Jpy,
}

impl Currency {
    /// Returns the ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Idr => "IDR",
            Self::Eur => "EUR",
            Self::Sgd => "SGD",
            Self::Jpy => "JPY",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "IDR" => Ok(Self::Idr),
            "EUR" => Ok(Self::Eur),
            "SGD" => Ok(Self::Sgd),
            "JPY" => Ok(Self::Jpy),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[rstest]
    #[case(dec!(1.005), dec!(1.01))]
    #[case(dec!(1.004), dec!(1.00))]
    #[case(dec!(2.345), dec!(2.35))]
    #[case(dec!(2.355), dec!(2.36))]
    #[case(dec!(100), dec!(100.00))]
    fn test_round_money_half_up(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(input), expected);
    }

    #[test]
    fn test_round_money_keeps_two_digits() {
        assert_eq!(round_money(dec!(10.129)).to_string(), "10.13");
        assert_eq!(round_money(dec!(3.14159)).scale(), 2);
    }

    #[test]
    fn test_round_money_pads_whole_amounts() {
        assert_eq!(round_money(Decimal::ZERO).to_string(), "0.00");
        assert_eq!(round_money(floor_at_zero(dec!(-7.5))).to_string(), "0.00");
        assert_eq!(round_money(dec!(42)).to_string(), "42.00");
        assert_eq!(round_money(dec!(-0.004)).to_string(), "0.00");
    }

    #[test]
    fn test_floor_at_zero() {
        assert_eq!(floor_at_zero(dec!(-0.01)), Decimal::ZERO);
        assert_eq!(floor_at_zero(dec!(12.50)), dec!(12.50));
        assert_eq!(floor_at_zero(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(Currency::Idr.to_string(), "IDR");
        assert_eq!(Currency::Jpy.code(), "JPY");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("usd").unwrap(), Currency::Usd);
        assert_eq!(Currency::from_str("EUR").unwrap(), Currency::Eur);
        assert!(Currency::from_str("XXX").is_err());
        assert!(Currency::from_str("").is_err());
    }
}
