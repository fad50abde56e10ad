use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::domain::{ReportId, StoredReport, Upload, UploadId};
use super::repository::{ReportRepository, RepositoryError};

/// Process-local repository. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryReportRepository {
    uploads: Mutex<HashMap<UploadId, Upload>>,
    reports: Mutex<Vec<StoredReport>>,
}

impl InMemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired reports, then expired uploads no remaining report refers to.
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut reports = lock(&self.reports)?;
        let before = reports.len();
        reports.retain(|stored| !stored.is_expired(now));

        let referenced: HashSet<&UploadId> =
            reports.iter().map(|stored| &stored.upload_id).collect();
        let mut uploads = lock(&self.uploads)?;
        let uploads_before = uploads.len();
        uploads.retain(|id, upload| !upload.is_expired(now) || referenced.contains(id));

        let (reports_dropped, uploads_dropped) =
            (before - reports.len(), uploads_before - uploads.len());
        if reports_dropped + uploads_dropped > 0 {
            debug!(reports_dropped, uploads_dropped, "purged expired entries");
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

impl ReportRepository for InMemoryReportRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn insert_upload(&self, upload: Upload) -> Result<Upload, RepositoryError> {
        self.purge_expired(upload.created_at)?;
        let mut uploads = lock(&self.uploads)?;
        if uploads.contains_key(&upload.id) {
            return Err(RepositoryError::Conflict);
        }
        uploads.insert(upload.id.clone(), upload.clone());
        Ok(upload)
    }

    fn fetch_upload(&self, id: &UploadId) -> Result<Option<Upload>, RepositoryError> {
        Ok(lock(&self.uploads)?.get(id).cloned())
    }

    fn insert_report(&self, report: StoredReport) -> Result<(), RepositoryError> {
        let now = report.created_at;
        {
            let mut reports = lock(&self.reports)?;
            if reports.iter().any(|stored| stored.id == report.id) {
                return Err(RepositoryError::Conflict);
            }
            reports.push(report);
        }
        self.purge_expired(now)
    }

    fn fetch_report(&self, id: &ReportId) -> Result<Option<StoredReport>, RepositoryError> {
        Ok(lock(&self.reports)?
            .iter()
            .find(|stored| &stored.id == id)
            .cloned())
    }

    fn recent_reports(
        &self,
        limit: usize,
        live_at: DateTime<Utc>,
    ) -> Result<Vec<StoredReport>, RepositoryError> {
        self.purge_expired(live_at)?;
        let reports = lock(&self.reports)?;
        let mut live: Vec<StoredReport> = reports
            .iter()
            .rev()
            .filter(|stored| !stored.is_expired(live_at))
            .cloned()
            .collect();
        // Insertion order already breaks ties between equal timestamps.
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        live.truncate(limit);
        Ok(live)
    }
}
