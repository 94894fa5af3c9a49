use crate::cli::ServeArgs;
use crate::infra::{AppState, CannedBackend};
use crate::routes::with_wizard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use mihogar::config::AppConfig;
use mihogar::error::AppError;
use mihogar::gateway::HttpBackendGateway;
use mihogar::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(backend_url) = args.backend_url.take() {
        config.backend.base_url = backend_url;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let routes = if args.canned {
        info!("serving against the built-in canned lending backend");
        with_wizard_routes(Arc::new(CannedBackend::default()))
    } else {
        let gateway = HttpBackendGateway::new(config.backend.base_url.clone());
        with_wizard_routes(Arc::new(gateway))
    };

    let app = routes
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, backend = %config.backend.base_url, "loan simulation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
