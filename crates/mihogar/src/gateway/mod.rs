//! Boundary to the remote lending backend.
//!
//! [`BackendGateway`] is the seam the wizard talks through: the production
//! implementation is [`HttpBackendGateway`], tests and demos plug in their
//! own. Nothing behind this trait retries on its own; a failed lookup is
//! surfaced and the caller re-triggers the action.

mod http;
pub mod types;

pub use http::HttpBackendGateway;

use async_trait::async_trait;
use rust_decimal::Decimal;

pub use types::{
    AppliedSubsidy, BonoEligibility, CreateSimulationRequest, CustomerId, CustomerSummary,
    EligibilitySnapshot, Installment, InstitutionId, InstitutionRate, LoanParameters, LoanProgram,
    LoanSimulation, PaymentPlan, ProgramId, ProgramVerdict, PropertyId, PropertySummary,
    RateRange, SimulationId,
};

/// Failures at the backend boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Could not reach the backend at all (DNS, connect, timeout).
    #[error("backend unreachable: {0}")]
    Transport(String),
    /// The backend answered with a non-success status.
    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The backend answered 2xx but the payload did not match the contract.
    #[error("backend returned an unreadable payload: {0}")]
    Payload(String),
}

#[async_trait]
pub trait BackendGateway: Send + Sync {
    async fn customers(&self) -> Result<Vec<CustomerSummary>, GatewayError>;
    async fn customer(&self, id: &CustomerId) -> Result<CustomerSummary, GatewayError>;

    async fn properties(&self) -> Result<Vec<PropertySummary>, GatewayError>;
    async fn property(&self, id: &PropertyId) -> Result<PropertySummary, GatewayError>;

    async fn loan_programs(&self) -> Result<Vec<LoanProgram>, GatewayError>;

    async fn rate_range(&self, program_id: &ProgramId) -> Result<RateRange, GatewayError>;
    async fn institutions_offering_rate(
        &self,
        program_id: &ProgramId,
        rate: Decimal,
    ) -> Result<Vec<InstitutionRate>, GatewayError>;
    async fn institution_rate(
        &self,
        institution_id: &InstitutionId,
        program_id: &ProgramId,
    ) -> Result<InstitutionRate, GatewayError>;

    async fn validate_eligibility(
        &self,
        customer_id: &CustomerId,
        property_id: &PropertyId,
    ) -> Result<EligibilitySnapshot, GatewayError>;

    async fn create_simulation(
        &self,
        request: &CreateSimulationRequest,
    ) -> Result<LoanSimulation, GatewayError>;
    async fn delete_simulation(&self, id: &SimulationId) -> Result<(), GatewayError>;
    async fn save_simulation(&self, id: &SimulationId) -> Result<LoanSimulation, GatewayError>;
}
