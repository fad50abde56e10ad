use chrono::{DateTime, Utc};

use super::domain::{ReportId, StoredReport, Upload, UploadId};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ReportRepository: Send + Sync {
    /// Short backend name surfaced in report metadata.
    fn backend(&self) -> &'static str;

    fn insert_upload(&self, upload: Upload) -> Result<Upload, RepositoryError>;
    fn fetch_upload(&self, id: &UploadId) -> Result<Option<Upload>, RepositoryError>;
    fn insert_report(&self, report: StoredReport) -> Result<(), RepositoryError>;
    fn fetch_report(&self, id: &ReportId) -> Result<Option<StoredReport>, RepositoryError>;

    /// Newest first, skipping reports that expired before `live_at`.
    fn recent_reports(
        &self,
        limit: usize,
        live_at: DateTime<Utc>,
    ) -> Result<Vec<StoredReport>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
