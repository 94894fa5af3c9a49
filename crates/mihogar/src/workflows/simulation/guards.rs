//! Per-step advance guards. Each guard inspects the wizard state and either
//! clears the transition or names the first thing still missing. Guards are
//! pure so they can run on every render as well as on advance.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use crate::domain::Money;
use crate::gateway::{EligibilitySnapshot, RateRange};

use super::domain::WizardForm;
use super::totals::DerivedTotals;

/// Minimum initial payment as a fraction of the property price.
pub const MIN_DOWN_PAYMENT_RATIO: Decimal = dec!(0.10);
pub const MIN_TERM_MONTHS: u32 = 60;
pub const MAX_TERM_MONTHS: u32 = 300;

/// Why the wizard refused to leave the current step. The message is shown
/// to the advisor verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdvanceBlocked {
    #[error("select a client and a property before continuing")]
    SelectionIncomplete,
    #[error("eligibility has not been confirmed for this client and property yet")]
    EligibilityPending,
    #[error("the client does not qualify for Nuevo Credito MiVivienda: {reasons}")]
    ProgramNotEligible { reasons: String },
    #[error(
        "the initial payment must be at least {required} (10% of the property price); \
         {shortfall} is still missing"
    )]
    InsufficientDownPayment { required: Money, shortfall: Money },
    #[error("enter an interest rate and pick an institution before continuing")]
    RateSelectionIncomplete,
    #[error("the allowed rate range for the program is not available; reload it and retry")]
    RateRangeUnavailable,
    #[error("a rate of {rate}% is outside the allowed range of {min}% to {max}%")]
    RateOutOfRange {
        rate: Decimal,
        min: Decimal,
        max: Decimal,
    },
    #[error("the loan term must be between {MIN_TERM_MONTHS} and {MAX_TERM_MONTHS} months")]
    TermOutOfRange,
}

/// Step 1: client picked, property picked, eligibility fetched and positive.
pub fn check_client_property(
    form: &WizardForm,
    eligibility: Option<&EligibilitySnapshot>,
) -> Result<(), AdvanceBlocked> {
    if form.customer_id.is_none() || form.property_id.is_none() {
        return Err(AdvanceBlocked::SelectionIncomplete);
    }
    let snapshot = eligibility.ok_or(AdvanceBlocked::EligibilityPending)?;
    if !snapshot.mivivienda.eligible {
        let reasons = if snapshot.mivivienda.failure_reasons.is_empty() {
            "no reason given".to_string()
        } else {
            snapshot.mivivienda.failure_reasons.join("; ")
        };
        return Err(AdvanceBlocked::ProgramNotEligible { reasons });
    }
    Ok(())
}

/// Step 2: cash plus selected bonos reach 10% of the property price.
/// Required amount and shortfall are rounded to the cent for display.
pub fn check_initial_payment(totals: &DerivedTotals) -> Result<(), AdvanceBlocked> {
    let required = totals.property_price.amount * MIN_DOWN_PAYMENT_RATIO;
    if totals.total_initial_payment.amount >= required {
        return Ok(());
    }
    let shortfall = required - totals.total_initial_payment.amount;
    Err(AdvanceBlocked::InsufficientDownPayment {
        required: Money::pen(required).round_cents(),
        shortfall: Money::pen(shortfall).round_cents(),
    })
}

/// Step 3: a rate typed, an institution picked, and the rate inside the
/// program's published band.
pub fn check_rate_institution(
    form: &WizardForm,
    rate_range: Option<&RateRange>,
) -> Result<(), AdvanceBlocked> {
    let rate = match (form.interest_rate, &form.institution_id) {
        (Some(rate), Some(_)) => rate,
        _ => return Err(AdvanceBlocked::RateSelectionIncomplete),
    };
    let range = rate_range.ok_or(AdvanceBlocked::RateRangeUnavailable)?;
    if !range.contains(rate) {
        return Err(AdvanceBlocked::RateOutOfRange {
            rate,
            min: range.min_rate,
            max: range.max_rate,
        });
    }
    Ok(())
}

/// Step 4: term within the program's 60 to 300 month window.
pub fn check_term_grace(form: &WizardForm) -> Result<(), AdvanceBlocked> {
    match form.term_in_months {
        Some(term) if (MIN_TERM_MONTHS..=MAX_TERM_MONTHS).contains(&term) => Ok(()),
        _ => Err(AdvanceBlocked::TermOutOfRange),
    }
}
