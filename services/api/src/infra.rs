//! Service-local plumbing: shared HTTP state and the canned lending backend
//! used for demos and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use mihogar::domain::{Currency, LoanProgramKind, Money, SimulationStatus, SubsidyType};
use mihogar::gateway::types::{BonoEligibility, ProgramVerdict};
use mihogar::gateway::{
    BackendGateway, CreateSimulationRequest, CustomerId, CustomerSummary, EligibilitySnapshot,
    GatewayError, Installment, InstitutionId, InstitutionRate, LoanProgram, LoanSimulation,
    PaymentPlan, ProgramId, PropertyId, PropertySummary, RateRange, SimulationId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Self-contained lending backend with a small Lima catalog. Simulations are
/// computed with French amortization so the demo numbers look plausible.
pub(crate) struct CannedBackend {
    customers: Vec<CustomerSummary>,
    properties: Vec<PropertySummary>,
    institutions: Vec<InstitutionRate>,
    simulations: Mutex<HashMap<SimulationId, LoanSimulation>>,
    next_simulation: AtomicU64,
}

impl Default for CannedBackend {
    fn default() -> Self {
        CannedBackend {
            customers: vec![
                CustomerSummary {
                    id: CustomerId::new("cust-001"),
                    full_name: "Maria Torres Quispe".to_string(),
                    email: "maria.torres@example.pe".to_string(),
                    phone_number: "+51 987 654 321".to_string(),
                    monthly_income: Money::pen(dec!(4500)),
                },
                CustomerSummary {
                    id: CustomerId::new("cust-002"),
                    full_name: "Jorge Luis Campos".to_string(),
                    email: "jorge.campos@example.pe".to_string(),
                    phone_number: "+51 912 345 678".to_string(),
                    monthly_income: Money::pen(dec!(6200)),
                },
            ],
            properties: vec![
                PropertySummary {
                    id: PropertyId::new("prop-001"),
                    property_code: "LIM-SJL-0147".to_string(),
                    property_type: "APARTMENT".to_string(),
                    price: Money::pen(dec!(300000)),
                    bedrooms: 3,
                    bathrooms: 2,
                    eco_certified: false,
                },
                PropertySummary {
                    id: PropertyId::new("prop-002"),
                    property_code: "LIM-COM-0093".to_string(),
                    property_type: "APARTMENT".to_string(),
                    price: Money::pen(dec!(185500)),
                    bedrooms: 2,
                    bathrooms: 1,
                    eco_certified: true,
                },
            ],
            institutions: vec![
                InstitutionRate {
                    institution_id: InstitutionId::new("inst-001"),
                    institution_name: "Banco Andino".to_string(),
                    min_rate: dec!(6.5),
                    max_rate: dec!(10.5),
                    insurance_rate: dec!(0.028),
                    offers_requested_rate: true,
                },
                InstitutionRate {
                    institution_id: InstitutionId::new("inst-002"),
                    institution_name: "Caja Pacifico".to_string(),
                    min_rate: dec!(7.2),
                    max_rate: dec!(11),
                    insurance_rate: dec!(0.031),
                    offers_requested_rate: true,
                },
            ],
            simulations: Mutex::new(HashMap::new()),
            next_simulation: AtomicU64::new(1),
        }
    }
}

impl CannedBackend {
    fn program_id() -> ProgramId {
        ProgramId::new("prog-ncmv")
    }

    fn compute_plan(&self, id: &SimulationId, request: &CreateSimulationRequest) -> PaymentPlan {
        let params = &request.parameters;
        let principal = decimal_to_f64(params.loan_amount.amount);
        let annual = decimal_to_f64(params.interest_rate.rate);
        let n = params.term_in_months.max(1);
        let monthly_rate = (1.0 + annual).powf(1.0 / 12.0) - 1.0;
        let payment = if monthly_rate > 0.0 {
            principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powi(-(n as i32)))
        } else {
            principal / n as f64
        };

        let now = Utc::now();
        let mut balance = principal;
        let mut installments = Vec::with_capacity(n as usize);
        for k in 1..=n {
            let interest = balance * monthly_rate;
            let amortization = payment - interest;
            let final_balance = (balance - amortization).max(0.0);
            installments.push(Installment {
                id: format!("{id}-q{k:03}"),
                installment_number: k,
                due_date: now + Duration::days(30 * i64::from(k)),
                initial_balance: money_from_f64(balance),
                interest: money_from_f64(interest),
                amortization: money_from_f64(amortization),
                other_costs: Money::zero_pen(),
                total_payment: money_from_f64(payment),
                final_balance: money_from_f64(final_balance),
            });
            balance = final_balance;
        }

        let insurance = 0.028;
        let tcea = (1.0 + monthly_rate + insurance / 12.0).powi(12) - 1.0;
        let van = params
            .discount_rate
            .map(|d| {
                let monthly_discount = decimal_to_f64(d) / 12.0;
                let discounted: f64 = (1..=n)
                    .map(|k| payment / (1.0 + monthly_discount).powi(k as i32))
                    .sum();
                discounted - principal
            })
            .unwrap_or(0.0);

        PaymentPlan {
            id: format!("{id}-plan"),
            simulation_id: id.clone(),
            tcea: decimal_from_f64(tcea).round_dp(6),
            van: money_from_f64(van),
            tir: decimal_from_f64(monthly_rate).round_dp(6),
            monthly_payment: money_from_f64(payment),
            installments,
        }
    }
}

fn decimal_to_f64(value: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or(0.0)
}

fn decimal_from_f64(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

fn money_from_f64(value: f64) -> Money {
    Money::pen(decimal_from_f64(value).round_dp(2))
}

#[async_trait]
impl BackendGateway for CannedBackend {
    async fn customers(&self) -> Result<Vec<CustomerSummary>, GatewayError> {
        Ok(self.customers.clone())
    }

    async fn customer(&self, id: &CustomerId) -> Result<CustomerSummary, GatewayError> {
        self.customers
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected {
                status: 404,
                message: format!("customer {id} not found"),
            })
    }

    async fn properties(&self) -> Result<Vec<PropertySummary>, GatewayError> {
        Ok(self.properties.clone())
    }

    async fn property(&self, id: &PropertyId) -> Result<PropertySummary, GatewayError> {
        self.properties
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected {
                status: 404,
                message: format!("property {id} not found"),
            })
    }

    async fn loan_programs(&self) -> Result<Vec<LoanProgram>, GatewayError> {
        Ok(vec![
            LoanProgram {
                id: Self::program_id(),
                name: LoanProgramKind::NuevoCreditoMivivienda,
            },
            LoanProgram {
                id: ProgramId::new("prog-tp"),
                name: LoanProgramKind::TechoPropio,
            },
        ])
    }

    async fn rate_range(&self, _program_id: &ProgramId) -> Result<RateRange, GatewayError> {
        Ok(RateRange {
            min_rate: dec!(6),
            max_rate: dec!(11),
            message: "Las tasas para Nuevo Credito MiVivienda van de 6% a 11%".to_string(),
        })
    }

    async fn institutions_offering_rate(
        &self,
        _program_id: &ProgramId,
        rate: Decimal,
    ) -> Result<Vec<InstitutionRate>, GatewayError> {
        Ok(self
            .institutions
            .iter()
            .filter(|i| rate >= i.min_rate && rate <= i.max_rate)
            .cloned()
            .collect())
    }

    async fn institution_rate(
        &self,
        institution_id: &InstitutionId,
        _program_id: &ProgramId,
    ) -> Result<InstitutionRate, GatewayError> {
        self.institutions
            .iter()
            .find(|i| &i.institution_id == institution_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected {
                status: 404,
                message: format!("institution {institution_id} not found"),
            })
    }

    async fn validate_eligibility(
        &self,
        customer_id: &CustomerId,
        property_id: &PropertyId,
    ) -> Result<EligibilitySnapshot, GatewayError> {
        let property = self.property(property_id).await?;
        let bonos = vec![
            BonoEligibility {
                bono_type: SubsidyType::BonoBuenPagador,
                amount: Some(dec!(25000)),
                currency: Some(Currency::Pen),
                eligible: true,
                price_range: Some("PEN 68600 - PEN 362200".to_string()),
                reason: Some("property price within Bono del Buen Pagador range".to_string()),
                failure_reason: None,
            },
            BonoEligibility {
                bono_type: SubsidyType::BonoVerde,
                amount: Some(dec!(5400)),
                currency: Some(Currency::Pen),
                eligible: property.eco_certified,
                price_range: None,
                reason: property
                    .eco_certified
                    .then(|| "eco-certified property".to_string()),
                failure_reason: (!property.eco_certified)
                    .then(|| "property lacks sustainability certification".to_string()),
            },
        ];

        Ok(EligibilitySnapshot {
            customer_id: customer_id.clone(),
            property_id: property_id.clone(),
            mivivienda: ProgramVerdict {
                eligible: true,
                reasons: vec!["income and property within program limits".to_string()],
                failure_reasons: Vec::new(),
                modalidad: None,
                available_bonos: bonos,
            },
            techo_propio: ProgramVerdict {
                eligible: false,
                reasons: Vec::new(),
                failure_reasons: vec!["property price above Techo Propio cap".to_string()],
                modalidad: None,
                available_bonos: Vec::new(),
            },
        })
    }

    async fn create_simulation(
        &self,
        request: &CreateSimulationRequest,
    ) -> Result<LoanSimulation, GatewayError> {
        let n = self.next_simulation.fetch_add(1, Ordering::Relaxed);
        let id = SimulationId::new(format!("sim-{n:06}"));
        let now = Utc::now();
        let plan = self.compute_plan(&id, request);

        let simulation = LoanSimulation {
            id: id.clone(),
            customer_id: request.customer_id.clone(),
            property_id: request.property_id.clone(),
            institution_id: request.institution_id.clone(),
            loan_program_id: request.loan_program_id.clone(),
            simulation_date: now,
            expires_at: now + Duration::days(30),
            status: SimulationStatus::Draft,
            parameters: request.parameters.clone(),
            payment_plan: Some(plan),
            subsidies: Vec::new(),
        };

        let mut store = self.simulations.lock().unwrap_or_else(|e| e.into_inner());
        store.insert(id, simulation.clone());
        Ok(simulation)
    }

    async fn delete_simulation(&self, id: &SimulationId) -> Result<(), GatewayError> {
        let mut store = self.simulations.lock().unwrap_or_else(|e| e.into_inner());
        store.remove(id).map(|_| ()).ok_or_else(|| GatewayError::Rejected {
            status: 404,
            message: format!("simulation {id} not found"),
        })
    }

    async fn save_simulation(&self, id: &SimulationId) -> Result<LoanSimulation, GatewayError> {
        let mut store = self.simulations.lock().unwrap_or_else(|e| e.into_inner());
        let simulation = store.get_mut(id).ok_or_else(|| GatewayError::Rejected {
            status: 404,
            message: format!("simulation {id} not found"),
        })?;
        simulation.status = SimulationStatus::Saved;
        Ok(simulation.clone())
    }
}
