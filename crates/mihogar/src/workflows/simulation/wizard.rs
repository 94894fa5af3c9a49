//! The wizard proper: one instance per advisor session, owning the form,
//! the fetched selections, and the lifecycle of the backend simulation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    GracePeriod, GraceType, InterestRate, LoanProgramKind, Money, RateType, SimulationStatus,
};
use crate::gateway::{
    BackendGateway, CreateSimulationRequest, CustomerId, CustomerSummary, EligibilitySnapshot,
    GatewayError, InstitutionId, InstitutionRate, LoanParameters, LoanProgram, LoanSimulation,
    PropertyId, PropertySummary, RateRange, SimulationId,
};

use super::domain::{WizardForm, WizardStep};
use super::guards::{self, AdvanceBlocked};
use super::totals::DerivedTotals;

/// Anything a wizard action can fail with.
#[derive(Debug, Clone, Error)]
pub enum WizardError {
    #[error(transparent)]
    Blocked(#[from] AdvanceBlocked),
    #[error(transparent)]
    Lookup(#[from] GatewayError),
    #[error("select a client before picking a property")]
    CustomerNotSelected,
    #[error("no simulation has been generated yet")]
    NothingGenerated,
    #[error("the Nuevo Credito MiVivienda program is not published by the backend")]
    ProgramUnavailable,
    #[error("amounts cannot be negative")]
    NegativeAmount,
    #[error("the form changed since the last simulation; generate again to see results")]
    GenerationRequired,
}

/// Proof that an eligibility response belongs to the current selection.
/// Issued when a property is picked, checked when the response lands, so a
/// slow response for a superseded selection is discarded instead of applied.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityTicket {
    seq: u64,
}

pub struct SimulationWizard<G> {
    gateway: Arc<G>,
    program: LoanProgram,
    step: WizardStep,
    form: WizardForm,
    current_customer: Option<CustomerSummary>,
    current_property: Option<PropertySummary>,
    eligibility: Option<EligibilitySnapshot>,
    rate_range: Option<RateRange>,
    filtered_institutions: Vec<InstitutionRate>,
    selected_institution_rate: Option<InstitutionRate>,
    generated: Option<LoanSimulation>,
    form_modified: bool,
    selection_seq: u64,
}

impl<G: BackendGateway> SimulationWizard<G> {
    /// Resolves the MiVivienda program and its rate band, then opens the
    /// wizard on step 1. A missing rate band is tolerated here; the step-3
    /// guard reports it when it actually matters.
    pub async fn start(gateway: Arc<G>) -> Result<Self, WizardError> {
        let programs = gateway.loan_programs().await?;
        let program = programs
            .into_iter()
            .find(|p| p.name == LoanProgramKind::NuevoCreditoMivivienda)
            .ok_or(WizardError::ProgramUnavailable)?;

        let rate_range = match gateway.rate_range(&program.id).await {
            Ok(range) => Some(range),
            Err(err) => {
                warn!(error = %err, "rate range unavailable at wizard start");
                None
            }
        };

        info!(program = %program.id, "simulation wizard opened");
        Ok(SimulationWizard {
            gateway,
            program,
            step: WizardStep::ClientProperty,
            form: WizardForm::default(),
            current_customer: None,
            current_property: None,
            eligibility: None,
            rate_range,
            filtered_institutions: Vec::new(),
            selected_institution_rate: None,
            generated: None,
            form_modified: false,
            selection_seq: 0,
        })
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &WizardForm {
        &self.form
    }

    pub fn generated(&self) -> Option<&LoanSimulation> {
        self.generated.as_ref()
    }

    /// Re-fetches the rate band after a failed start or a backend hiccup.
    pub async fn reload_rate_range(&mut self) -> Result<&RateRange, WizardError> {
        let range = self.gateway.rate_range(&self.program.id).await?;
        Ok(self.rate_range.insert(range))
    }

    /// Marks the results stale once a simulation exists. Every mutator that
    /// feeds the simulation calls this.
    fn touch(&mut self) {
        if self.generated.is_some() {
            self.form_modified = true;
        }
    }

    /// Picks a client. Resets the property and eligibility downstream and
    /// invalidates any eligibility response still in flight. The cash
    /// contribution stays as entered.
    pub async fn select_customer(&mut self, id: &CustomerId) -> Result<(), WizardError> {
        let customer = self.gateway.customer(id).await?;
        self.selection_seq += 1;
        self.form.customer_id = Some(customer.id.clone());
        self.form.reset_customer_dependents();
        self.current_customer = Some(customer);
        self.current_property = None;
        self.eligibility = None;
        self.touch();
        Ok(())
    }

    /// Records the property selection and hands back the ticket the caller
    /// must present together with the eligibility response.
    pub fn set_property(&mut self, property: PropertySummary) -> Result<EligibilityTicket, WizardError> {
        if self.form.customer_id.is_none() {
            return Err(WizardError::CustomerNotSelected);
        }
        self.selection_seq += 1;
        self.form.reset_property_dependents();
        self.form.property_id = Some(property.id.clone());
        self.current_property = Some(property);
        self.eligibility = None;
        self.touch();
        Ok(EligibilityTicket {
            seq: self.selection_seq,
        })
    }

    /// Applies an eligibility response, unless the selection moved on while
    /// the request was in flight. The bono selection mirrors the snapshot's
    /// eligible bonos; it is not editable by the advisor.
    pub fn apply_eligibility(&mut self, ticket: EligibilityTicket, snapshot: EligibilitySnapshot) {
        if ticket.seq != self.selection_seq {
            debug!(
                ticket = ticket.seq,
                current = self.selection_seq,
                "discarding stale eligibility response"
            );
            return;
        }
        self.form.selected_bonos = snapshot
            .mivivienda
            .eligible_bonos()
            .map(|bono| (bono.bono_type, true))
            .collect();
        self.eligibility = Some(snapshot);
        self.touch();
    }

    /// Picks a property and fetches eligibility for the pair in one go.
    pub async fn select_property(&mut self, id: &PropertyId) -> Result<(), WizardError> {
        let property = self.gateway.property(id).await?;
        let ticket = self.set_property(property)?;
        let customer_id = self
            .form
            .customer_id
            .clone()
            .ok_or(WizardError::CustomerNotSelected)?;
        let snapshot = self.gateway.validate_eligibility(&customer_id, id).await?;
        self.apply_eligibility(ticket, snapshot);
        Ok(())
    }

    pub fn set_contribution(&mut self, amount: Decimal) -> Result<(), WizardError> {
        if amount < Decimal::ZERO {
            return Err(WizardError::NegativeAmount);
        }
        self.form.user_contribution = amount;
        self.touch();
        Ok(())
    }

    /// Accepts the advisor's raw rate input. Anything unparsable or
    /// non-positive clears the rate and the institution list; a valid rate
    /// refreshes the list of institutions offering it. A failed search
    /// leaves the rate in place with an empty list so a retry can re-run it.
    pub async fn set_interest_rate(&mut self, raw: &str) -> Result<(), WizardError> {
        self.form.institution_id = None;
        self.selected_institution_rate = None;
        self.touch();

        let parsed = raw.trim().parse::<Decimal>().ok();
        let rate = match parsed {
            Some(rate) if rate > Decimal::ZERO => rate,
            _ => {
                self.form.interest_rate = None;
                self.filtered_institutions.clear();
                return Ok(());
            }
        };
        self.form.interest_rate = Some(rate);

        match self
            .gateway
            .institutions_offering_rate(&self.program.id, rate)
            .await
        {
            Ok(institutions) => self.filtered_institutions = institutions,
            Err(err) => {
                warn!(error = %err, %rate, "institution search failed");
                self.filtered_institutions.clear();
            }
        }
        Ok(())
    }

    pub fn set_rate_type(&mut self, rate_type: RateType) {
        self.form.rate_type = rate_type;
        self.touch();
    }

    pub fn set_discount_rate(&mut self, rate: Option<Decimal>) -> Result<(), WizardError> {
        if matches!(rate, Some(r) if r < Decimal::ZERO) {
            return Err(WizardError::NegativeAmount);
        }
        self.form.discount_rate = rate;
        self.touch();
        Ok(())
    }

    pub async fn select_institution(&mut self, id: &InstitutionId) -> Result<(), WizardError> {
        let detail = self.gateway.institution_rate(id, &self.program.id).await?;
        self.form.institution_id = Some(detail.institution_id.clone());
        self.selected_institution_rate = Some(detail);
        self.touch();
        Ok(())
    }

    pub fn set_term(&mut self, months: u32) {
        self.form.term_in_months = Some(months);
        self.touch();
    }

    pub fn set_grace_period(&mut self, months: u32, grace_type: GraceType) {
        self.form.grace_period_months = months;
        self.form.grace_type = grace_type;
        self.touch();
    }

    pub fn totals(&self) -> DerivedTotals {
        DerivedTotals::derive(
            &self.form,
            self.eligibility.as_ref(),
            self.current_property.as_ref().map(|p| p.price),
        )
    }

    fn guard_for(&self, step: WizardStep) -> Result<(), AdvanceBlocked> {
        match step {
            WizardStep::ClientProperty => {
                guards::check_client_property(&self.form, self.eligibility.as_ref())
            }
            WizardStep::InitialPayment => guards::check_initial_payment(&self.totals()),
            WizardStep::RateInstitution => {
                guards::check_rate_institution(&self.form, self.rate_range.as_ref())
            }
            WizardStep::TermGrace => guards::check_term_grace(&self.form),
            WizardStep::Results => Ok(()),
        }
    }

    /// Moves one step forward if the current step's guard clears. Leaving
    /// step 4 additionally requires a simulation that is still fresh.
    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        self.guard_for(self.step)?;
        if self.step == WizardStep::TermGrace {
            if self.generated.is_none() || self.form_modified {
                return Err(WizardError::GenerationRequired);
            }
        }
        if let Some(next) = self.step.forward() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Moves one step back. Never guarded; entered data is kept.
    pub fn back(&mut self) -> WizardStep {
        if let Some(prev) = self.step.backward() {
            self.step = prev;
        }
        self.step
    }

    fn build_request(&self) -> Result<CreateSimulationRequest, WizardError> {
        let customer_id = self
            .form
            .customer_id
            .clone()
            .ok_or(AdvanceBlocked::SelectionIncomplete)?;
        let institution_id = self
            .form
            .institution_id
            .clone()
            .ok_or(AdvanceBlocked::RateSelectionIncomplete)?;
        let rate = self
            .form
            .interest_rate
            .ok_or(AdvanceBlocked::RateSelectionIncomplete)?;
        let term = self.form.term_in_months.ok_or(AdvanceBlocked::TermOutOfRange)?;
        let entered_rate = InterestRate {
            rate,
            rate_type: self.form.rate_type,
            capitalization_period: None,
        };

        let totals = self.totals();
        let grace_period = if self.form.grace_period_months > 0 {
            GracePeriod {
                duration_in_months: self.form.grace_period_months,
                grace_type: self.form.grace_type,
            }
        } else {
            GracePeriod::none()
        };

        Ok(CreateSimulationRequest {
            customer_id,
            property_id: self.form.property_id.clone(),
            institution_id,
            loan_program_id: self.program.id.clone(),
            parameters: LoanParameters {
                property_price: totals.property_price,
                initial_down_payment: totals.total_initial_payment,
                loan_amount: totals.loan_amount,
                term_in_months: term,
                currency: crate::domain::Currency::Pen,
                // Rates travel as fractions; the form holds percentage points.
                interest_rate: InterestRate {
                    rate: entered_rate.as_fraction(),
                    ..entered_rate
                },
                grace_period,
                discount_rate: self.form.discount_rate.map(|d| d / Decimal::ONE_HUNDRED),
            },
        })
    }

    /// Runs every guard, deletes the previous simulation, then asks the
    /// backend to compute a fresh one. On success the results are marked
    /// current and the wizard lands on step 5. When the old simulation
    /// cannot be deleted it stays as the last known good result; a failed
    /// create leaves nothing generated and the step unchanged.
    pub async fn generate(&mut self) -> Result<&LoanSimulation, WizardError> {
        for step in [
            WizardStep::ClientProperty,
            WizardStep::InitialPayment,
            WizardStep::RateInstitution,
            WizardStep::TermGrace,
        ] {
            self.guard_for(step)?;
        }
        let request = self.build_request()?;

        if let Some(previous) = self.generated.take() {
            match self.gateway.delete_simulation(&previous.id).await {
                Ok(()) => debug!(simulation = %previous.id, "previous simulation deleted"),
                Err(err) => {
                    warn!(error = %err, simulation = %previous.id, "could not delete previous simulation");
                    self.generated = Some(previous);
                    return Err(err.into());
                }
            }
        }

        let simulation = self.gateway.create_simulation(&request).await?;
        info!(simulation = %simulation.id, "simulation generated");
        self.form_modified = false;
        self.step = WizardStep::Results;
        Ok(self.generated.insert(simulation))
    }

    /// Persists the generated simulation on the backend and reflects the
    /// SAVED status locally.
    pub async fn save(&mut self) -> Result<&LoanSimulation, WizardError> {
        let current = self.generated.as_ref().ok_or(WizardError::NothingGenerated)?;
        let mut saved = self.gateway.save_simulation(&current.id).await?;
        saved.status = SimulationStatus::Saved;
        info!(simulation = %saved.id, "simulation saved");
        Ok(self.generated.insert(saved))
    }

    /// Abandons the flow. An already generated simulation is saved first so
    /// no orphaned draft is left behind, then the wizard resets to step 1.
    pub async fn cancel(&mut self) -> Result<(), WizardError> {
        if let Some(simulation) = self.generated.take() {
            if let Err(err) = self.gateway.save_simulation(&simulation.id).await {
                warn!(error = %err, simulation = %simulation.id, "could not save simulation on cancel");
            }
        }
        self.reset();
        info!("simulation wizard reset");
        Ok(())
    }

    fn reset(&mut self) {
        self.step = WizardStep::ClientProperty;
        self.form = WizardForm::default();
        self.current_customer = None;
        self.current_property = None;
        self.eligibility = None;
        self.filtered_institutions.clear();
        self.selected_institution_rate = None;
        self.generated = None;
        self.form_modified = false;
        self.selection_seq += 1;
    }

    /// Serializable snapshot of the whole wizard for the HTTP layer.
    pub fn view(&self) -> WizardView {
        WizardView {
            step: self.step,
            step_number: self.step.number(),
            step_label: self.step.label().to_string(),
            customer: self.current_customer.clone(),
            property: self.current_property.clone(),
            eligibility: self.eligibility.clone(),
            totals: self.totals(),
            rate_range: self.rate_range.clone(),
            institutions: self.filtered_institutions.clone(),
            selected_institution: self.selected_institution_rate.clone(),
            form_modified: self.form_modified,
            blocked: self.guard_for(self.step).err(),
            generated: self.generated.as_ref().map(GeneratedSummary::from),
        }
    }
}

/// What the advisor's screen renders. One of these per response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub step: WizardStep,
    pub step_number: usize,
    pub step_label: String,
    pub customer: Option<CustomerSummary>,
    pub property: Option<PropertySummary>,
    pub eligibility: Option<EligibilitySnapshot>,
    pub totals: DerivedTotals,
    pub rate_range: Option<RateRange>,
    pub institutions: Vec<InstitutionRate>,
    pub selected_institution: Option<InstitutionRate>,
    pub form_modified: bool,
    #[serde(serialize_with = "serialize_blocked")]
    pub blocked: Option<AdvanceBlocked>,
    pub generated: Option<GeneratedSummary>,
}

fn serialize_blocked<S: serde::Serializer>(
    blocked: &Option<AdvanceBlocked>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match blocked {
        Some(reason) => serializer.serialize_some(&reason.to_string()),
        None => serializer.serialize_none(),
    }
}

/// The headline numbers of a generated simulation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSummary {
    pub id: SimulationId,
    pub status: SimulationStatus,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub tcea: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub tir: Option<Decimal>,
    pub van: Option<Money>,
    pub monthly_payment: Option<Money>,
    pub expires_at: DateTime<Utc>,
}

impl From<&LoanSimulation> for GeneratedSummary {
    fn from(simulation: &LoanSimulation) -> Self {
        let plan = simulation.payment_plan.as_ref();
        GeneratedSummary {
            id: simulation.id.clone(),
            status: simulation.status,
            tcea: plan.map(|p| p.tcea),
            tir: plan.map(|p| p.tir),
            van: plan.map(|p| p.van),
            monthly_payment: plan.map(|p| p.monthly_payment),
            expires_at: simulation.expires_at,
        }
    }
}
