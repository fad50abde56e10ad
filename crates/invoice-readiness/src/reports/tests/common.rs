use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::analysis::AnalysisContext;
use crate::reports::domain::{ReportId, StoredReport, Upload, UploadId};
use crate::reports::repository::{ReportRepository, RepositoryError};
use crate::reports::{readiness_router, InMemoryReportRepository, ReadinessService};

pub(super) const BALANCED_INVOICE: &str = r#"{
    "invoice": {
        "invoice_number": "INV-1001",
        "issue_date": "2025-01-31",
        "currency": "AED",
        "total_excl_vat": 100,
        "vat_amount": 5,
        "total_incl_vat": 105
    },
    "seller": { "name": "Acme", "trn": "100200300400500", "address": "Dubai", "country": "AE" },
    "buyer": { "name": "Globex", "trn": "100900800700600", "address": "Abu Dhabi", "country": "AE" },
    "lines": [
        { "description": "Widget", "qty": 2, "unit_price": 25, "vat_rate": 0.05, "line_total": 50 },
        { "description": "Gadget", "qty": 1, "unit_price": 50, "vat_rate": 0.05, "line_total": 50 }
    ]
}"#;

pub(super) const FLAT_CSV: &str = "\
invoice_number,issue_date,currency,total_excl_vat,vat_amount,total_incl_vat,buyer_trn,seller_trn
INV-1,2025-02-01,usd,100,5,110,,
INV-2,2025-02-02,USD,50,2.5,52.5,123,456
";

pub(super) fn context() -> Arc<AnalysisContext> {
    Arc::new(AnalysisContext::load(None).expect("bundled schema loads"))
}

pub(super) fn build_service() -> (
    ReadinessService<InMemoryReportRepository>,
    Arc<InMemoryReportRepository>,
) {
    let repository = Arc::new(InMemoryReportRepository::new());
    let service = ReadinessService::new(context(), repository.clone());
    (service, repository)
}

pub(super) fn readiness_router_with_service(
    service: ReadinessService<InMemoryReportRepository>,
) -> axum::Router {
    readiness_router(Arc::new(service))
}

pub(super) struct UnavailableRepository;

impl ReportRepository for UnavailableRepository {
    fn backend(&self) -> &'static str {
        "offline"
    }

    fn insert_upload(&self, _upload: Upload) -> Result<Upload, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_upload(&self, _id: &UploadId) -> Result<Option<Upload>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_report(&self, _report: StoredReport) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_report(&self, _id: &ReportId) -> Result<Option<StoredReport>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn recent_reports(
        &self,
        _limit: usize,
        _live_at: DateTime<Utc>,
    ) -> Result<Vec<StoredReport>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
