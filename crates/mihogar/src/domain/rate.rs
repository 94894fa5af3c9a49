use super::enums::{CapitalizationPeriod, GraceType, RateType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// An annual interest rate as entered in the back office: percentage points
/// (e.g. `7.5` for 7.5%). The backend expects a fraction, so requests go
/// through [`InterestRate::as_fraction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestRate {
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    #[serde(rename = "type")]
    pub rate_type: RateType,
    pub capitalization_period: Option<CapitalizationPeriod>,
}

impl InterestRate {
    pub fn effective(rate: Decimal) -> Self {
        Self {
            rate,
            rate_type: RateType::Effective,
            capitalization_period: None,
        }
    }

    /// Percentage points divided by 100, the unit the wire protocol uses.
    pub fn as_fraction(&self) -> Decimal {
        self.rate / dec!(100)
    }
}

/// Initial loan phase where payments are deferred (TOTAL) or reduced to
/// interest only (PARTIAL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GracePeriod {
    pub duration_in_months: u32,
    #[serde(rename = "type")]
    pub grace_type: GraceType,
}

impl GracePeriod {
    pub fn none() -> Self {
        Self {
            duration_in_months: 0,
            grace_type: GraceType::Total,
        }
    }
}
