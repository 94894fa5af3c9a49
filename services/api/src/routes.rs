use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

use mihogar::error::AppError;
use mihogar::gateway::BackendGateway;
use mihogar::workflows::simulation::wizard_router;

use crate::infra::AppState;

/// Catalog passthroughs for the selection pickers plus the wizard itself,
/// mounted under the same prefix the lending backend uses.
pub(crate) fn with_wizard_routes<G: BackendGateway + 'static>(gateway: Arc<G>) -> Router {
    Router::new()
        .route("/api/v1/customers", get(list_customers::<G>))
        .route("/api/v1/properties", get(list_properties::<G>))
        .route("/api/v1/loan-programs", get(list_programs::<G>))
        .with_state(Arc::clone(&gateway))
        .nest("/api/v1/simulations/wizard", wizard_router(gateway))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

async fn list_customers<G: BackendGateway>(
    State(gateway): State<Arc<G>>,
) -> Result<impl IntoResponse, AppError> {
    let customers = gateway.customers().await?;
    Ok(Json(customers))
}

async fn list_properties<G: BackendGateway>(
    State(gateway): State<Arc<G>>,
) -> Result<impl IntoResponse, AppError> {
    let properties = gateway.properties().await?;
    Ok(Json(properties))
}

async fn list_programs<G: BackendGateway>(
    State(gateway): State<Arc<G>>,
) -> Result<impl IntoResponse, AppError> {
    let programs = gateway.loan_programs().await?;
    Ok(Json(programs))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::infra::CannedBackend;

    fn router() -> Router {
        with_wizard_routes(Arc::new(CannedBackend::default()))
    }

    #[tokio::test]
    async fn catalog_endpoints_serve_the_canned_data() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/customers")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        let customers = payload.as_array().expect("array");
        assert_eq!(customers.len(), 2);
        assert!(customers[0].get("monthlyIncome").is_some());
    }

    #[tokio::test]
    async fn wizard_sessions_open_under_the_nested_prefix() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/simulations/wizard")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn healthcheck_is_always_ok() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
