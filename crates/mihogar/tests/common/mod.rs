//! Shared in-memory lending backend for the wizard integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use mihogar::domain::{
    Currency, GracePeriod, InterestRate, LoanProgramKind, Money, SimulationStatus, SubsidyType,
};
use mihogar::gateway::types::{BonoEligibility, ProgramVerdict};
use mihogar::gateway::{
    BackendGateway, CreateSimulationRequest, CustomerId, CustomerSummary,
    EligibilitySnapshot, GatewayError, InstitutionId, InstitutionRate, Installment,
    LoanProgram, LoanSimulation, PaymentPlan, ProgramId, PropertyId, PropertySummary,
    RateRange, SimulationId,
};

pub fn customer(id: &str) -> CustomerSummary {
    CustomerSummary {
        id: CustomerId::new(id),
        full_name: "Maria Torres".to_string(),
        email: "maria.torres@example.pe".to_string(),
        phone_number: "+51 987 654 321".to_string(),
        monthly_income: Money::pen(dec!(4500)),
    }
}

pub fn property(id: &str, price: Decimal) -> PropertySummary {
    PropertySummary {
        id: PropertyId::new(id),
        property_code: format!("LIM-{id}"),
        property_type: "APARTMENT".to_string(),
        price: Money::pen(price),
        bedrooms: 3,
        bathrooms: 2,
        eco_certified: false,
    }
}

pub fn bono(
    kind: SubsidyType,
    amount: Decimal,
    eligible: bool,
) -> BonoEligibility {
    BonoEligibility {
        bono_type: kind,
        amount: Some(amount),
        currency: Some(Currency::Pen),
        eligible,
        price_range: None,
        reason: eligible.then(|| "within program limits".to_string()),
        failure_reason: (!eligible).then(|| "property is not eco certified".to_string()),
    }
}

pub fn eligible_snapshot(
    customer_id: &str,
    property_id: &str,
    bonos: Vec<BonoEligibility>,
) -> EligibilitySnapshot {
    EligibilitySnapshot {
        customer_id: CustomerId::new(customer_id),
        property_id: PropertyId::new(property_id),
        mivivienda: ProgramVerdict {
            eligible: true,
            reasons: vec!["income within program range".to_string()],
            failure_reasons: Vec::new(),
            modalidad: None,
            available_bonos: bonos,
        },
        techo_propio: ProgramVerdict {
            eligible: false,
            reasons: Vec::new(),
            failure_reasons: vec!["income above Techo Propio cap".to_string()],
            modalidad: None,
            available_bonos: Vec::new(),
        },
    }
}

/// In-memory lending backend with a call log and failure switches.
pub struct MockBackend {
    pub calls: Mutex<Vec<String>>,
    pub customers: Vec<CustomerSummary>,
    pub properties: Vec<PropertySummary>,
    pub snapshot: Mutex<EligibilitySnapshot>,
    pub rate_range: RateRange,
    pub institutions: Vec<InstitutionRate>,
    pub fail_eligibility: AtomicBool,
    pub fail_institution_search: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
    next_simulation: AtomicU64,
}

impl MockBackend {
    pub fn standard() -> Self {
        MockBackend {
            calls: Mutex::new(Vec::new()),
            customers: vec![customer("cust-1"), customer("cust-2")],
            properties: vec![
                property("prop-1", dec!(300000)),
                property("prop-2", dec!(185500)),
            ],
            snapshot: Mutex::new(eligible_snapshot(
                "cust-1",
                "prop-1",
                vec![
                    bono(SubsidyType::BonoBuenPagador, dec!(25000), true),
                    bono(SubsidyType::BonoVerde, dec!(5400), false),
                ],
            )),
            rate_range: RateRange {
                min_rate: dec!(6),
                max_rate: dec!(11),
                message: "Rates between 6% and 11% for this program".to_string(),
            },
            institutions: vec![InstitutionRate {
                institution_id: InstitutionId::new("inst-1"),
                institution_name: "Banco Andino".to_string(),
                min_rate: dec!(6.5),
                max_rate: dec!(10.5),
                insurance_rate: dec!(0.028),
                offers_requested_rate: true,
            }],
            fail_eligibility: AtomicBool::new(false),
            fail_institution_search: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            next_simulation: AtomicU64::new(1),
        }
    }

    pub fn set_snapshot(&self, snapshot: EligibilitySnapshot) {
        *self.snapshot.lock().expect("snapshot lock") = snapshot;
    }

    fn log(&self, entry: impl Into<String>) {
        self.calls.lock().expect("call log lock").push(entry.into());
    }

    pub fn logged(&self) -> Vec<String> {
        self.calls.lock().expect("call log lock").clone()
    }

    fn fabricate(&self, request: &CreateSimulationRequest) -> LoanSimulation {
        let n = self.next_simulation.fetch_add(1, Ordering::Relaxed);
        let id = SimulationId::new(format!("sim-{n:06}"));
        let now = Utc::now();
        let params = request.parameters.clone();
        let monthly =
            params.loan_amount.amount / Decimal::from(params.term_in_months.max(1));
        LoanSimulation {
            id: id.clone(),
            customer_id: request.customer_id.clone(),
            property_id: request.property_id.clone(),
            institution_id: request.institution_id.clone(),
            loan_program_id: request.loan_program_id.clone(),
            simulation_date: now,
            expires_at: now + Duration::days(30),
            status: SimulationStatus::Draft,
            payment_plan: Some(PaymentPlan {
                id: format!("plan-{n:06}"),
                simulation_id: id.clone(),
                tcea: dec!(0.0865),
                van: Money::pen(dec!(12500)),
                tir: dec!(0.0071),
                monthly_payment: Money::pen(monthly.round_dp(2)),
                installments: vec![Installment {
                    id: format!("inst-{n:06}-1"),
                    installment_number: 1,
                    due_date: now + Duration::days(30),
                    initial_balance: params.loan_amount,
                    interest: Money::pen(dec!(1687.50)),
                    amortization: Money::pen(dec!(500)),
                    other_costs: Money::zero_pen(),
                    total_payment: Money::pen(dec!(2187.50)),
                    final_balance: params.loan_amount,
                }],
            }),
            parameters: params,
            subsidies: Vec::new(),
        }
    }
}

#[async_trait]
impl BackendGateway for MockBackend {
    async fn customers(&self) -> Result<Vec<CustomerSummary>, GatewayError> {
        self.log("customers");
        Ok(self.customers.clone())
    }

    async fn customer(&self, id: &CustomerId) -> Result<CustomerSummary, GatewayError> {
        self.log(format!("customer:{id}"));
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
        self.log("properties");
        Ok(self.properties.clone())
    }

    async fn property(&self, id: &PropertyId) -> Result<PropertySummary, GatewayError> {
        self.log(format!("property:{id}"));
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
        self.log("loan_programs");
        Ok(vec![
            LoanProgram {
                id: ProgramId::new("prog-tp"),
                name: LoanProgramKind::TechoPropio,
            },
            LoanProgram {
                id: ProgramId::new("prog-mv"),
                name: LoanProgramKind::NuevoCreditoMivivienda,
            },
        ])
    }

    async fn rate_range(&self, program_id: &ProgramId) -> Result<RateRange, GatewayError> {
        self.log(format!("rate_range:{program_id}"));
        Ok(self.rate_range.clone())
    }

    async fn institutions_offering_rate(
        &self,
        program_id: &ProgramId,
        rate: Decimal,
    ) -> Result<Vec<InstitutionRate>, GatewayError> {
        self.log(format!("institutions_offering_rate:{program_id}:{rate}"));
        if self.fail_institution_search.load(Ordering::Relaxed) {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }
        Ok(self.institutions.clone())
    }

    async fn institution_rate(
        &self,
        institution_id: &InstitutionId,
        program_id: &ProgramId,
    ) -> Result<InstitutionRate, GatewayError> {
        self.log(format!("institution_rate:{institution_id}:{program_id}"));
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
        self.log(format!("validate_eligibility:{customer_id}:{property_id}"));
        if self.fail_eligibility.load(Ordering::Relaxed) {
            return Err(GatewayError::Transport("connection timed out".to_string()));
        }
        Ok(self.snapshot.lock().expect("snapshot lock").clone())
    }

    async fn create_simulation(
        &self,
        request: &CreateSimulationRequest,
    ) -> Result<LoanSimulation, GatewayError> {
        self.log("create_simulation");
        if self.fail_create.load(Ordering::Relaxed) {
            return Err(GatewayError::Rejected {
                status: 500,
                message: "simulation engine unavailable".to_string(),
            });
        }
        Ok(self.fabricate(request))
    }

    async fn delete_simulation(&self, id: &SimulationId) -> Result<(), GatewayError> {
        self.log(format!("delete_simulation:{id}"));
        if self.fail_delete.load(Ordering::Relaxed) {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        Ok(())
    }

    async fn save_simulation(&self, id: &SimulationId) -> Result<LoanSimulation, GatewayError> {
        self.log(format!("save_simulation:{id}"));
        let request = CreateSimulationRequest {
            customer_id: CustomerId::new("cust-1"),
            property_id: Some(PropertyId::new("prop-1")),
            institution_id: InstitutionId::new("inst-1"),
            loan_program_id: ProgramId::new("prog-mv"),
            parameters: mihogar::gateway::LoanParameters {
                property_price: Money::pen(dec!(300000)),
                initial_down_payment: Money::pen(dec!(30000)),
                loan_amount: Money::pen(dec!(270000)),
                term_in_months: 240,
                currency: Currency::Pen,
                interest_rate: InterestRate::effective(dec!(7.5)),
                grace_period: GracePeriod::none(),
                discount_rate: None,
            },
        };
        let mut simulation = self.fabricate(&request);
        simulation.id = id.clone();
        simulation.status = SimulationStatus::Saved;
        Ok(simulation)
    }
}
