use chrono::Duration;
use invoice_readiness::analysis::AnalysisContext;
use invoice_readiness::config::AppConfig;
use invoice_readiness::error::AppError;
use invoice_readiness::reports::{InMemoryReportRepository, ReadinessService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Load the configured target schema once for the lifetime of the process.
pub(crate) fn analysis_context(config: &AppConfig) -> Result<Arc<AnalysisContext>, AppError> {
    let context = AnalysisContext::load(config.analysis.target_schema.as_deref())?;
    Ok(Arc::new(context))
}

pub(crate) fn readiness_service(
    config: &AppConfig,
    context: Arc<AnalysisContext>,
) -> Arc<ReadinessService<InMemoryReportRepository>> {
    let repository = Arc::new(InMemoryReportRepository::new());
    let service = ReadinessService::new(context, repository)
        .with_report_ttl(Duration::days(config.uploads.report_ttl_days));
    Arc::new(service)
}
