use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::domain::{
    AnalyzeRequest, Report, ReportId, ReportSummary, StoredReport, Upload, UploadId,
    UploadSubmission,
};
use super::repository::{ReportRepository, RepositoryError};
use crate::analysis::{decode, preview, AnalysisContext, TablePreview};

pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const MAX_RECENT_LIMIT: usize = 50;
const DEFAULT_REPORT_TTL_DAYS: i64 = 7;

static UPLOAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static REPORT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str, sequence: &AtomicU64, now: DateTime<Utc>) -> String {
    let id = sequence.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{:x}{id:04x}", now.timestamp_millis())
}

/// Service composing the analysis context and the report repository.
pub struct ReadinessService<R> {
    context: Arc<AnalysisContext>,
    repository: Arc<R>,
    report_ttl: Duration,
}

impl<R> ReadinessService<R>
where
    R: ReportRepository + 'static,
{
    pub fn new(context: Arc<AnalysisContext>, repository: Arc<R>) -> Self {
        Self {
            context,
            repository,
            report_ttl: Duration::days(DEFAULT_REPORT_TTL_DAYS),
        }
    }

    pub fn with_report_ttl(mut self, report_ttl: Duration) -> Self {
        self.report_ttl = report_ttl;
        self
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    /// Store a raw document. Empty input is rejected.
    pub fn upload(&self, submission: UploadSubmission) -> Result<Upload, ReportServiceError> {
        let raw = submission
            .text
            .filter(|text| !text.is_empty())
            .ok_or(ValidationError::NoInput)?;

        let created_at = Utc::now();
        let upload = Upload {
            id: UploadId(next_id("u", &UPLOAD_SEQUENCE, created_at)),
            created_at,
            expires_at: created_at + self.report_ttl,
            country: non_empty(submission.country),
            erp: non_empty(submission.erp),
            rows_parsed: decode(&raw).len(),
            raw,
        };

        let stored = self.repository.insert_upload(upload)?;
        info!(
            upload_id = %stored.id,
            rows = stored.rows_parsed,
            bytes = stored.raw.len(),
            "upload stored"
        );
        Ok(stored)
    }

    /// Analyse a stored upload and persist the resulting report.
    pub fn analyze(&self, request: AnalyzeRequest) -> Result<Report, ReportServiceError> {
        let upload_id = request
            .upload_id
            .filter(|id| !id.is_empty())
            .map(UploadId)
            .ok_or(ValidationError::MissingUploadId)?;

        let upload = self
            .repository
            .fetch_upload(&upload_id)?
            .ok_or_else(|| ReportServiceError::NotFound(MissingResource::Upload(upload_id)))?;

        let questionnaire = request.questionnaire.unwrap_or_default();
        let analysis = self.context.analyze(&upload.raw, &questionnaire);

        let created_at = Utc::now();
        let report_id = ReportId(next_id("r", &REPORT_SEQUENCE, created_at));
        let report = Report::new(report_id.clone(), analysis, &upload, self.repository.backend());

        self.repository.insert_report(StoredReport {
            id: report_id,
            upload_id: upload.id.clone(),
            created_at,
            expires_at: created_at + self.report_ttl,
            overall: report.scores.overall,
            report: report.clone(),
        })?;

        info!(
            report_id = %report.report_id,
            upload_id = %upload.id,
            overall = report.scores.overall,
            readiness = report.readiness.label(),
            "analysis completed"
        );
        Ok(report)
    }

    /// Fetch a report that has not yet expired.
    pub fn report(&self, report_id: &ReportId) -> Result<Report, ReportServiceError> {
        match self.repository.fetch_report(report_id)? {
            Some(stored) if !stored.is_expired(Utc::now()) => Ok(stored.report),
            _ => {
                warn!(report_id = %report_id, "report not found");
                Err(ReportServiceError::NotFound(MissingResource::Report(
                    report_id.clone(),
                )))
            }
        }
    }

    /// Newest reports first; `limit` defaults to 10 and is capped at 50.
    pub fn recent(&self, limit: Option<usize>) -> Result<Vec<ReportSummary>, ReportServiceError> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).min(MAX_RECENT_LIMIT);
        let reports = self.repository.recent_reports(limit, Utc::now())?;
        Ok(reports.iter().map(StoredReport::summary).collect())
    }

    pub fn preview(&self, upload_id: &UploadId) -> Result<TablePreview, ReportServiceError> {
        let upload = self.repository.fetch_upload(upload_id)?.ok_or_else(|| {
            ReportServiceError::NotFound(MissingResource::Upload(upload_id.clone()))
        })?;
        Ok(preview(&decode(&upload.raw)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Error raised by the readiness service.
#[derive(Debug, thiserror::Error)]
pub enum ReportServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(MissingResource),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl ReportServiceError {
    /// Stable machine-readable code returned to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::MissingUploadId) => "MISSING_UPLOAD_ID",
            Self::Validation(ValidationError::NoInput) => "NO_INPUT",
            Self::NotFound(MissingResource::Upload(_)) => "UPLOAD_NOT_FOUND",
            Self::NotFound(MissingResource::Report(_)) => "NOT_FOUND",
            Self::Storage(_) => "STORAGE_FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("uploadId is required")]
    MissingUploadId,
    #[error("no input provided")]
    NoInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingResource {
    Upload(UploadId),
    Report(ReportId),
}

impl fmt::Display for MissingResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingResource::Upload(id) => write!(f, "upload {id}"),
            MissingResource::Report(id) => write!(f, "report {id}"),
        }
    }
}
