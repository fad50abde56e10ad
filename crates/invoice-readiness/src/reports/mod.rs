//! Upload intake, report persistence, and the HTTP surface around the
//! analysis engine.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AnalyzeRequest, Report, ReportId, ReportMeta, ReportSummary, StoredReport, Upload, UploadId,
    UploadSubmission,
};
pub use memory::InMemoryReportRepository;
pub use repository::{ReportRepository, RepositoryError};
pub use router::readiness_router;
pub use service::{
    MissingResource, ReadinessService, ReportServiceError, ValidationError, DEFAULT_RECENT_LIMIT,
    MAX_RECENT_LIMIT,
};
