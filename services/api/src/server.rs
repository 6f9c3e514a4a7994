use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemorySubmissionRepository, InMemoryTemplateRepository, OutboxMailTransport,
};
use crate::routes::with_calculator_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use followup_health::config::AppConfig;
use followup_health::error::AppError;
use followup_health::submissions::SubmissionService;
use followup_health::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let submissions = Arc::new(InMemorySubmissionRepository::default());
    let templates = Arc::new(InMemoryTemplateRepository::default());
    let mail = Arc::new(OutboxMailTransport::from_config(&config.mail));
    let service = Arc::new(SubmissionService::new(
        submissions,
        templates,
        mail,
        config.mail.app_url.clone(),
    ));

    let app = with_calculator_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "follow-up health dashboard ready");

    axum::serve(listener, app).await?;
    Ok(())
}
