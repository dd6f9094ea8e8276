use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryNoticePublisher, InMemoryOffboardingRepository};
use crate::routes::with_offboarding_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use offboard::config::AppConfig;
use offboard::error::AppError;
use offboard::telemetry;
use offboard::workflows::offboarding::OffboardingService;
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

    let repository = Arc::new(InMemoryOffboardingRepository::default());
    let notices = Arc::new(InMemoryNoticePublisher::default());
    let offboarding_service = Arc::new(OffboardingService::new(repository, notices));

    let app = with_offboarding_routes(offboarding_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "offboarding case service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
