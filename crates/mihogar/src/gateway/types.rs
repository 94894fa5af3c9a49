//! Request/response shapes exchanged with the lending backend.
//!
//! The backend owns the business logic; these structs only mirror its JSON
//! contract (camelCase fields, SCREAMING_SNAKE_CASE enums, rates as fractions,
//! all amounts in PEN, timestamps in ISO 8601).

use crate::domain::{
    Currency, GracePeriod, InterestRate, LoanProgramKind, Money, SimulationStatus, SubsidyType,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(CustomerId);
string_id!(PropertyId);
string_id!(InstitutionId);
string_id!(ProgramId);
string_id!(SimulationId);

/// The slice of a customer record the simulation flow displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub monthly_income: Money,
}

/// The slice of a property record the simulation flow needs: the price feeds
/// the derived totals, the rest is presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: PropertyId,
    pub property_code: String,
    pub property_type: String,
    pub price: Money,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub eco_certified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanProgram {
    pub id: ProgramId,
    pub name: LoanProgramKind,
}

/// Allowed interest-rate band for a loan program, as published by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRange {
    #[serde(with = "rust_decimal::serde::float")]
    pub min_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_rate: Decimal,
    pub message: String,
}

impl RateRange {
    pub fn contains(&self, rate: Decimal) -> bool {
        rate >= self.min_rate && rate <= self.max_rate
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionRate {
    pub institution_id: InstitutionId,
    pub institution_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub insurance_rate: Decimal,
    pub offers_requested_rate: bool,
}

/// One subsidy verdict inside an eligibility snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonoEligibility {
    #[serde(rename = "type")]
    pub bono_type: SubsidyType,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub eligible: bool,
    pub price_range: Option<String>,
    pub reason: Option<String>,
    pub failure_reason: Option<String>,
}

/// Eligibility verdict for one loan program. When `eligible` is true,
/// `reasons` carries the explanation; otherwise `failure_reasons` does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramVerdict {
    pub eligible: bool,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub failure_reasons: Vec<String>,
    /// Techo Propio only: COMPRA or CONSTRUCCION.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modalidad: Option<String>,
    #[serde(default)]
    pub available_bonos: Vec<BonoEligibility>,
}

impl ProgramVerdict {
    pub fn explanation(&self) -> &[String] {
        if self.eligible {
            &self.reasons
        } else {
            &self.failure_reasons
        }
    }

    pub fn eligible_bonos(&self) -> impl Iterator<Item = &BonoEligibility> {
        self.available_bonos.iter().filter(|bono| bono.eligible)
    }
}

/// Immutable eligibility result for a (customer, property) pair. Refetched
/// whenever either selection changes; never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilitySnapshot {
    pub customer_id: CustomerId,
    pub property_id: PropertyId,
    pub mivivienda: ProgramVerdict,
    pub techo_propio: ProgramVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanParameters {
    pub property_price: Money,
    pub initial_down_payment: Money,
    pub loan_amount: Money,
    pub term_in_months: u32,
    pub currency: Currency,
    pub interest_rate: InterestRate,
    pub grace_period: GracePeriod,
    /// Fraction (percent / 100), present only when the user wants a VAN.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub discount_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: String,
    pub installment_number: u32,
    pub due_date: DateTime<Utc>,
    pub initial_balance: Money,
    pub interest: Money,
    pub amortization: Money,
    pub other_costs: Money,
    pub total_payment: Money,
    pub final_balance: Money,
}

/// Backend-computed schedule and financial indicators for a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlan {
    pub id: String,
    pub simulation_id: SimulationId,
    #[serde(with = "rust_decimal::serde::float")]
    pub tcea: Decimal,
    pub van: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub tir: Decimal,
    pub monthly_payment: Money,
    pub installments: Vec<Installment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedSubsidy {
    pub id: String,
    pub subsidy_config_id: String,
    pub name: String,
    pub amount: Money,
    pub simulation_id: SimulationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSimulation {
    pub id: SimulationId,
    pub customer_id: CustomerId,
    pub property_id: Option<PropertyId>,
    pub institution_id: InstitutionId,
    pub loan_program_id: ProgramId,
    pub simulation_date: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: SimulationStatus,
    pub parameters: LoanParameters,
    pub payment_plan: Option<PaymentPlan>,
    #[serde(default)]
    pub subsidies: Vec<AppliedSubsidy>,
}

/// Body of `POST /simulations`. All fields required except the property,
/// which the backend tolerates as null for off-catalog simulations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSimulationRequest {
    pub customer_id: CustomerId,
    pub property_id: Option<PropertyId>,
    pub institution_id: InstitutionId,
    pub loan_program_id: ProgramId,
    pub parameters: LoanParameters,
}
