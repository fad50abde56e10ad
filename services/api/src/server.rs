use crate::cli::ServeArgs;
use crate::infra::{analysis_context, readiness_service, AppState};
use crate::routes::with_readiness_routes;
use axum::extract::DefaultBodyLimit;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use invoice_readiness::config::AppConfig;
use invoice_readiness::error::AppError;
use invoice_readiness::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    let context = analysis_context(&config)?;
    info!(
        target_keys = context.target_keys().len(),
        schema = ?config.analysis.target_schema,
        "target schema loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = readiness_service(&config, context);

    let app = with_readiness_routes(service)
        .layer(DefaultBodyLimit::max(config.uploads.max_upload_bytes))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "invoice readiness service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
