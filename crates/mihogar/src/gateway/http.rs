use super::types::{
    CreateSimulationRequest, CustomerId, CustomerSummary, EligibilitySnapshot, InstitutionId,
    InstitutionRate, LoanProgram, LoanSimulation, ProgramId, PropertyId, PropertySummary,
    RateRange, SimulationId,
};
use super::{BackendGateway, GatewayError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

/// Reqwest-backed implementation of [`BackendGateway`].
///
/// Paths mirror the backend's REST layout under a versioned base URL
/// (e.g. `https://lending.example.pe/api/v1`).
#[derive(Debug, Clone)]
pub struct HttpBackendGateway {
    client: Client,
    base_url: String,
}

impl HttpBackendGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: extract_message(&body, status),
            });
        }

        serde_json::from_str(&body).map_err(|err| GatewayError::Payload(err.to_string()))
    }

    async fn execute_empty(&self, request: RequestBuilder) -> Result<(), GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: extract_message(&body, status),
            });
        }
        Ok(())
    }
}

/// The backend reports failures as `{"message": "..."}`; fall back to the
/// status line when the body is empty or not JSON.
fn extract_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|message| message.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

#[async_trait]
impl BackendGateway for HttpBackendGateway {
    async fn customers(&self) -> Result<Vec<CustomerSummary>, GatewayError> {
        self.execute(self.client.get(self.url("customers"))).await
    }

    async fn customer(&self, id: &CustomerId) -> Result<CustomerSummary, GatewayError> {
        self.execute(self.client.get(self.url(&format!("customers/{id}"))))
            .await
    }

    async fn properties(&self) -> Result<Vec<PropertySummary>, GatewayError> {
        self.execute(self.client.get(self.url("properties"))).await
    }

    async fn property(&self, id: &PropertyId) -> Result<PropertySummary, GatewayError> {
        self.execute(self.client.get(self.url(&format!("properties/{id}"))))
            .await
    }

    async fn loan_programs(&self) -> Result<Vec<LoanProgram>, GatewayError> {
        self.execute(self.client.get(self.url("loan-programs"))).await
    }

    async fn rate_range(&self, program_id: &ProgramId) -> Result<RateRange, GatewayError> {
        self.execute(
            self.client
                .get(self.url("institutions/rates/range"))
                .query(&[("loanProgramId", program_id.0.as_str())]),
        )
        .await
    }

    async fn institutions_offering_rate(
        &self,
        program_id: &ProgramId,
        rate: Decimal,
    ) -> Result<Vec<InstitutionRate>, GatewayError> {
        self.execute(
            self.client
                .get(self.url("institutions/rates/search"))
                .query(&[
                    ("loanProgramId", program_id.0.as_str()),
                    ("rate", &rate.to_string()),
                ]),
        )
        .await
    }

    async fn institution_rate(
        &self,
        institution_id: &InstitutionId,
        program_id: &ProgramId,
    ) -> Result<InstitutionRate, GatewayError> {
        self.execute(
            self.client
                .get(self.url(&format!("institutions/{institution_id}/rates")))
                .query(&[("loanProgramId", program_id.0.as_str())]),
        )
        .await
    }

    async fn validate_eligibility(
        &self,
        customer_id: &CustomerId,
        property_id: &PropertyId,
    ) -> Result<EligibilitySnapshot, GatewayError> {
        self.execute(
            self.client
                .post(self.url("loan-programs/eligibility/validate-with-property"))
                .query(&[
                    ("customerId", customer_id.0.as_str()),
                    ("propertyId", property_id.0.as_str()),
                ]),
        )
        .await
    }

    async fn create_simulation(
        &self,
        request: &CreateSimulationRequest,
    ) -> Result<LoanSimulation, GatewayError> {
        self.execute(self.client.post(self.url("simulations")).json(request))
            .await
    }

    async fn delete_simulation(&self, id: &SimulationId) -> Result<(), GatewayError> {
        self.execute_empty(self.client.delete(self.url(&format!("simulations/{id}"))))
            .await
    }

    async fn save_simulation(&self, id: &SimulationId) -> Result<LoanSimulation, GatewayError> {
        self.execute(
            self.client
                .post(self.url(&format!("simulations/{id}/save"))),
        )
        .await
    }
}
