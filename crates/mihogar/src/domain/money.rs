use super::enums::{Currency, FallbackEnum};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount plus its currency. Amounts crossing the backend boundary are
/// never negative; the wizard enforces that before any request is built.
/// Serialized with a numeric amount to match the backend's JSON contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Peruvian soles, the fixed currency of the simulation flow.
    pub fn pen(amount: Decimal) -> Self {
        Self::new(amount, Currency::Pen)
    }

    pub fn zero_pen() -> Self {
        Self::pen(Decimal::ZERO)
    }

    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Rounds to the cent for display and reporting.
    pub fn round_cents(self) -> Self {
        Self::new(self.amount.round_dp(2), self.currency)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency.as_str(), self.amount.round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pen_constructor_fixes_currency() {
        let m = Money::pen(dec!(300000));
        assert_eq!(m.currency, Currency::Pen);
        assert_eq!(m.amount, dec!(300000));
    }

    #[test]
    fn negativity_check_ignores_negative_zero() {
        assert!(Money::pen(dec!(-0.01)).is_negative());
        assert!(!Money::pen(dec!(0)).is_negative());
        assert!(!Money::pen(dec!(12.50)).is_negative());
    }

    #[test]
    fn rounds_to_the_cent() {
        assert_eq!(Money::pen(dec!(10.006)).round_cents().amount, dec!(10.01));
        assert_eq!(Money::pen(dec!(10.004)).round_cents().amount, dec!(10.00));
    }

    #[test]
    fn display_includes_currency_code() {
        assert_eq!(Money::pen(dec!(25000)).to_string(), "PEN 25000");
    }
}
