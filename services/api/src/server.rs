use crate::cli::ServeArgs;
use crate::infra::{
    provider_registry, AppState, InMemoryOutcomeRepository, TracingAuditSink,
};
use crate::routes::with_appointment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use loket::config::AppConfig;
use loket::error::AppError;
use loket::telemetry;
use loket::workflows::appointments::BookingService;
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

    // Provider resolution happens once, here; an unknown id aborts startup.
    let registry = provider_registry();
    info!(
        providers = %registry.plugin_ids().join(", "),
        "appointment providers registered"
    );
    let provider = registry.resolve(&config.appointments.provider)?;

    let repository = Arc::new(InMemoryOutcomeRepository::default());
    let audit = Arc::new(TracingAuditSink);
    let booking_service = Arc::new(BookingService::new(
        repository,
        audit,
        provider,
        config.appointments.booking_timeout(),
    ));

    let app = with_appointment_routes(booking_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        provider = %config.appointments.provider,
        "appointment orchestrator ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
