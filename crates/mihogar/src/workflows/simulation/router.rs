//! HTTP surface of the wizard. Stateless handlers over the session store;
//! every mutation returns the refreshed [`WizardView`] so clients never
//! have to merge partial updates.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex as AsyncMutex;

use crate::domain::{GraceType, RateType};
use crate::gateway::{BackendGateway, CustomerId, InstitutionId, PropertyId};

use super::session::{WizardSessionId, WizardSessions};
use super::wizard::{SimulationWizard, WizardError, WizardView};

pub struct WizardApi<G> {
    pub gateway: Arc<G>,
    pub sessions: WizardSessions<G>,
}

/// Builds the router mounted at `/api/v1/simulations/wizard`.
pub fn wizard_router<G: BackendGateway + 'static>(gateway: Arc<G>) -> Router {
    let api = Arc::new(WizardApi {
        gateway,
        sessions: WizardSessions::new(),
    });

    Router::new()
        .route("/", post(create_session::<G>))
        .route("/:id", get(view_session::<G>))
        .route("/:id/customer", post(select_customer::<G>))
        .route("/:id/property", post(select_property::<G>))
        .route("/:id/contribution", post(set_contribution::<G>))
        .route("/:id/rate", post(set_rate::<G>))
        .route("/:id/institution", post(select_institution::<G>))
        .route("/:id/term", post(set_term::<G>))
        .route("/:id/next", post(advance::<G>))
        .route("/:id/back", post(go_back::<G>))
        .route("/:id/generate", post(generate::<G>))
        .route("/:id/save", post(save::<G>))
        .route("/:id/cancel", post(cancel::<G>))
        .with_state(api)
}

/// Validation problems come back as 422 with the guard message; backend
/// failures as 502 so clients can tell "fix your input" from "try again".
fn error_response(err: WizardError) -> Response {
    let status = match &err {
        WizardError::Blocked(_)
        | WizardError::GenerationRequired
        | WizardError::NegativeAmount
        | WizardError::CustomerNotSelected
        | WizardError::NothingGenerated => StatusCode::UNPROCESSABLE_ENTITY,
        WizardError::Lookup(_) | WizardError::ProgramUnavailable => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn session_not_found(id: &WizardSessionId) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("unknown wizard session {id}") })),
    )
        .into_response()
}

fn lock_session<G: BackendGateway>(
    api: &WizardApi<G>,
    id: &WizardSessionId,
) -> Result<Arc<AsyncMutex<SimulationWizard<G>>>, Response> {
    api.sessions.get(id).ok_or_else(|| session_not_found(id))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionCreated {
    session_id: WizardSessionId,
    view: WizardView,
}

async fn create_session<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
) -> Result<Response, Response> {
    let (id, slot) = api
        .sessions
        .create(Arc::clone(&api.gateway))
        .await
        .map_err(error_response)?;
    let view = slot.lock().await.view();
    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: id,
            view,
        }),
    )
        .into_response())
}

async fn view_session<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let view = slot.lock().await.view();
    Ok(Json(view).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectCustomerBody {
    customer_id: CustomerId,
}

async fn select_customer<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
    Json(body): Json<SelectCustomerBody>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let mut wizard = slot.lock().await;
    wizard
        .select_customer(&body.customer_id)
        .await
        .map_err(error_response)?;
    Ok(Json(wizard.view()).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectPropertyBody {
    property_id: PropertyId,
}

async fn select_property<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
    Json(body): Json<SelectPropertyBody>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let mut wizard = slot.lock().await;
    wizard
        .select_property(&body.property_id)
        .await
        .map_err(error_response)?;
    Ok(Json(wizard.view()).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionBody {
    #[serde(default)]
    amount: Option<Decimal>,
}

async fn set_contribution<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
    Json(body): Json<ContributionBody>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let mut wizard = slot.lock().await;
    if let Some(amount) = body.amount {
        wizard.set_contribution(amount).map_err(error_response)?;
    }
    Ok(Json(wizard.view()).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateBody {
    #[serde(default)]
    rate: Option<String>,
    #[serde(default)]
    rate_type: Option<RateType>,
    #[serde(default)]
    discount_rate: Option<Decimal>,
}

async fn set_rate<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
    Json(body): Json<RateBody>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let mut wizard = slot.lock().await;
    if let Some(rate_type) = body.rate_type {
        wizard.set_rate_type(rate_type);
    }
    if body.discount_rate.is_some() {
        wizard
            .set_discount_rate(body.discount_rate)
            .map_err(error_response)?;
    }
    if let Some(raw) = body.rate {
        wizard.set_interest_rate(&raw).await.map_err(error_response)?;
    }
    Ok(Json(wizard.view()).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectInstitutionBody {
    institution_id: InstitutionId,
}

async fn select_institution<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
    Json(body): Json<SelectInstitutionBody>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let mut wizard = slot.lock().await;
    wizard
        .select_institution(&body.institution_id)
        .await
        .map_err(error_response)?;
    Ok(Json(wizard.view()).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TermBody {
    #[serde(default)]
    term_in_months: Option<u32>,
    #[serde(default)]
    grace_period_months: Option<u32>,
    #[serde(default)]
    grace_type: Option<GraceType>,
}

async fn set_term<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
    Json(body): Json<TermBody>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let mut wizard = slot.lock().await;
    if let Some(term) = body.term_in_months {
        wizard.set_term(term);
    }
    if body.grace_period_months.is_some() || body.grace_type.is_some() {
        let months = body
            .grace_period_months
            .unwrap_or(wizard.form().grace_period_months);
        let grace_type = body.grace_type.unwrap_or(wizard.form().grace_type);
        wizard.set_grace_period(months, grace_type);
    }
    Ok(Json(wizard.view()).into_response())
}

async fn advance<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let mut wizard = slot.lock().await;
    wizard.advance().map_err(error_response)?;
    Ok(Json(wizard.view()).into_response())
}

async fn go_back<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let mut wizard = slot.lock().await;
    wizard.back();
    Ok(Json(wizard.view()).into_response())
}

async fn generate<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let mut wizard = slot.lock().await;
    wizard.generate().await.map_err(error_response)?;
    Ok(Json(wizard.view()).into_response())
}

async fn save<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    let mut wizard = slot.lock().await;
    wizard.save().await.map_err(error_response)?;
    Ok(Json(wizard.view()).into_response())
}

/// Cancels the flow and closes the session.
async fn cancel<G: BackendGateway>(
    State(api): State<Arc<WizardApi<G>>>,
    Path(id): Path<WizardSessionId>,
) -> Result<Response, Response> {
    let slot = lock_session(&api, &id)?;
    {
        let mut wizard = slot.lock().await;
        wizard.cancel().await.map_err(error_response)?;
    }
    api.sessions.remove(&id);
    Ok(StatusCode::NO_CONTENT.into_response())
}
