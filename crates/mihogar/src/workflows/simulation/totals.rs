//! Derived money figures shown on the initial-payment step. Pure
//! recomputation from the form plus the fetched selections, never stored.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::Money;
use crate::gateway::EligibilitySnapshot;

use super::domain::WizardForm;

/// The figures the initial-payment step displays. Always in PEN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedTotals {
    pub user_contribution: Money,
    pub total_bonos: Money,
    pub total_initial_payment: Money,
    pub property_price: Money,
    pub loan_amount: Money,
}

impl DerivedTotals {
    /// Recomputes every total from scratch. A subsidy only counts when the
    /// snapshot marks it eligible, the advisor left it selected, and the
    /// backend quoted an amount for it.
    pub fn derive(
        form: &WizardForm,
        eligibility: Option<&EligibilitySnapshot>,
        property_price: Option<Money>,
    ) -> DerivedTotals {
        let price = property_price.unwrap_or_else(Money::zero_pen);

        let mut bonos = Decimal::ZERO;
        if let Some(snapshot) = eligibility {
            for bono in snapshot.mivivienda.eligible_bonos() {
                let selected = form
                    .selected_bonos
                    .get(&bono.bono_type)
                    .copied()
                    .unwrap_or(false);
                if selected {
                    if let Some(amount) = bono.amount {
                        bonos += amount;
                    }
                }
            }
        }

        let initial = form.user_contribution + bonos;
        let loan = (price.amount - initial).max(Decimal::ZERO);

        DerivedTotals {
            user_contribution: Money::pen(form.user_contribution),
            total_bonos: Money::pen(bonos),
            total_initial_payment: Money::pen(initial),
            property_price: price,
            loan_amount: Money::pen(loan),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::domain::{Currency, SubsidyType};
    use crate::gateway::types::{BonoEligibility, ProgramVerdict};
    use crate::gateway::{CustomerId, PropertyId};

    fn bono(kind: SubsidyType, amount: Option<Decimal>, eligible: bool) -> BonoEligibility {
        BonoEligibility {
            bono_type: kind,
            amount,
            currency: amount.map(|_| Currency::Pen),
            eligible,
            price_range: None,
            reason: None,
            failure_reason: None,
        }
    }

    fn snapshot(bonos: Vec<BonoEligibility>) -> EligibilitySnapshot {
        EligibilitySnapshot {
            customer_id: CustomerId::new("cust-1"),
            property_id: PropertyId::new("prop-1"),
            mivivienda: ProgramVerdict {
                eligible: true,
                reasons: Vec::new(),
                failure_reasons: Vec::new(),
                modalidad: None,
                available_bonos: bonos,
            },
            techo_propio: ProgramVerdict {
                eligible: false,
                reasons: Vec::new(),
                failure_reasons: Vec::new(),
                modalidad: None,
                available_bonos: Vec::new(),
            },
        }
    }

    #[test]
    fn selected_eligible_bonos_add_up() {
        let mut form = WizardForm {
            user_contribution: dec!(5000),
            ..WizardForm::default()
        };
        form.selected_bonos.insert(SubsidyType::BonoBuenPagador, true);
        form.selected_bonos.insert(SubsidyType::BonoVerde, true);

        let snap = snapshot(vec![
            bono(SubsidyType::BonoBuenPagador, Some(dec!(25000)), true),
            bono(SubsidyType::BonoVerde, Some(dec!(5400)), true),
        ]);

        let totals = DerivedTotals::derive(&form, Some(&snap), Some(Money::pen(dec!(300000))));
        assert_eq!(totals.total_bonos.amount, dec!(30400));
        assert_eq!(totals.total_initial_payment.amount, dec!(35400));
        assert_eq!(totals.loan_amount.amount, dec!(264600));
    }

    #[test]
    fn ineligible_or_deselected_bonos_never_count() {
        let mut form = WizardForm {
            user_contribution: dec!(5000),
            ..WizardForm::default()
        };
        // Selected in the form but marked ineligible by the backend.
        form.selected_bonos.insert(SubsidyType::BonoVerde, true);
        // Eligible but toggled off by the advisor.
        form.selected_bonos.insert(SubsidyType::BonoBuenPagador, false);

        let snap = snapshot(vec![
            bono(SubsidyType::BonoBuenPagador, Some(dec!(25000)), true),
            bono(SubsidyType::BonoVerde, Some(dec!(5400)), false),
        ]);

        let totals = DerivedTotals::derive(&form, Some(&snap), Some(Money::pen(dec!(300000))));
        assert_eq!(totals.total_bonos.amount, Decimal::ZERO);
        assert_eq!(totals.total_initial_payment.amount, dec!(5000));
    }

    #[test]
    fn eligible_bono_without_quoted_amount_is_skipped() {
        let mut form = WizardForm::default();
        form.selected_bonos.insert(SubsidyType::BonoBuenPagador, true);

        let snap = snapshot(vec![bono(SubsidyType::BonoBuenPagador, None, true)]);
        let totals = DerivedTotals::derive(&form, Some(&snap), Some(Money::pen(dec!(300000))));
        assert_eq!(totals.total_bonos.amount, Decimal::ZERO);
    }

    #[test]
    fn loan_amount_clamps_at_zero() {
        let form = WizardForm {
            user_contribution: dec!(400000),
            ..WizardForm::default()
        };
        let totals = DerivedTotals::derive(&form, None, Some(Money::pen(dec!(300000))));
        assert_eq!(totals.loan_amount.amount, Decimal::ZERO);

        // Deriving again from the same inputs reproduces the same figures.
        let again = DerivedTotals::derive(&form, None, Some(Money::pen(dec!(300000))));
        assert_eq!(totals, again);
    }

    #[test]
    fn missing_property_yields_zero_price() {
        let form = WizardForm::default();
        let totals = DerivedTotals::derive(&form, None, None);
        assert_eq!(totals.property_price.amount, Decimal::ZERO);
        assert_eq!(totals.loan_amount.amount, Decimal::ZERO);
    }
}
