//! Step ordering and the form the wizard accumulates across steps.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{GraceType, RateType, SubsidyType};
use crate::gateway::{CustomerId, InstitutionId, PropertyId};

/// The five stations of the simulation wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardStep {
    ClientProperty,
    InitialPayment,
    RateInstitution,
    TermGrace,
    Results,
}

impl WizardStep {
    pub fn ordered() -> &'static [WizardStep] {
        &[
            WizardStep::ClientProperty,
            WizardStep::InitialPayment,
            WizardStep::RateInstitution,
            WizardStep::TermGrace,
            WizardStep::Results,
        ]
    }

    /// One-based position shown in the step header.
    pub fn number(self) -> usize {
        match self {
            WizardStep::ClientProperty => 1,
            WizardStep::InitialPayment => 2,
            WizardStep::RateInstitution => 3,
            WizardStep::TermGrace => 4,
            WizardStep::Results => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::ClientProperty => "Client and property",
            WizardStep::InitialPayment => "Initial payment",
            WizardStep::RateInstitution => "Rate and institution",
            WizardStep::TermGrace => "Term and grace period",
            WizardStep::Results => "Results",
        }
    }

    pub fn forward(self) -> Option<WizardStep> {
        match self {
            WizardStep::ClientProperty => Some(WizardStep::InitialPayment),
            WizardStep::InitialPayment => Some(WizardStep::RateInstitution),
            WizardStep::RateInstitution => Some(WizardStep::TermGrace),
            WizardStep::TermGrace => Some(WizardStep::Results),
            WizardStep::Results => None,
        }
    }

    pub fn backward(self) -> Option<WizardStep> {
        match self {
            WizardStep::ClientProperty => None,
            WizardStep::InitialPayment => Some(WizardStep::ClientProperty),
            WizardStep::RateInstitution => Some(WizardStep::InitialPayment),
            WizardStep::TermGrace => Some(WizardStep::RateInstitution),
            WizardStep::Results => Some(WizardStep::TermGrace),
        }
    }
}

/// Everything the advisor has typed or picked so far. Selections made on a
/// later step never invalidate earlier ones, but re-picking the customer or
/// property resets what depends on them.
#[derive(Debug, Clone)]
pub struct WizardForm {
    pub customer_id: Option<CustomerId>,
    pub property_id: Option<PropertyId>,
    /// Cash the client brings, on top of any subsidies.
    pub user_contribution: Decimal,
    /// Per-subsidy opt-in toggles, seeded from the eligibility verdict.
    pub selected_bonos: BTreeMap<SubsidyType, bool>,
    pub interest_rate: Option<Decimal>,
    pub rate_type: RateType,
    pub discount_rate: Option<Decimal>,
    pub institution_id: Option<InstitutionId>,
    pub term_in_months: Option<u32>,
    pub grace_period_months: u32,
    pub grace_type: GraceType,
}

impl Default for WizardForm {
    fn default() -> Self {
        WizardForm {
            customer_id: None,
            property_id: None,
            user_contribution: Decimal::ZERO,
            selected_bonos: BTreeMap::new(),
            interest_rate: None,
            rate_type: RateType::Effective,
            discount_rate: None,
            institution_id: None,
            term_in_months: None,
            grace_period_months: 0,
            grace_type: GraceType::Total,
        }
    }
}

impl WizardForm {
    /// Clears the fields that derive from the selected property, keeping
    /// the customer selection intact.
    pub fn reset_property_dependents(&mut self) {
        self.property_id = None;
        self.selected_bonos.clear();
    }

    /// Clears everything that derives from the selected customer. The cash
    /// contribution is the advisor's own input and survives the change.
    pub fn reset_customer_dependents(&mut self) {
        self.reset_property_dependents();
    }
}
