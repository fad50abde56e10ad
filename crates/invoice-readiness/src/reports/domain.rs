use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{Analysis, CoverageResult, Questionnaire, Readiness, RuleFinding, Scores};

/// Identifier wrapper for stored uploads (`u_...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(pub String);

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for persisted reports (`r_...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw document as received, before any analysis.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadSubmission {
    pub text: Option<String>,
    pub country: Option<String>,
    pub erp: Option<String>,
}

impl UploadSubmission {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Stored upload. `raw` is kept verbatim so it can be re-analysed later.
///
/// An upload is retained until `expires_at` or for as long as a live report
/// refers to it, whichever is later.
#[derive(Debug, Clone)]
pub struct Upload {
    pub id: UploadId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub country: Option<String>,
    pub erp: Option<String>,
    pub rows_parsed: usize,
    pub raw: String,
}

/// Body of an analysis request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub questionnaire: Option<Questionnaire>,
}

/// Shareable result of one analysis run. Never mutated once built.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: ReportId,
    pub scores: Scores,
    pub coverage: CoverageResult,
    pub rule_findings: Vec<RuleFinding>,
    pub gaps: Vec<String>,
    pub readiness: Readiness,
    pub meta: ReportMeta,
}

impl Report {
    pub fn new(report_id: ReportId, analysis: Analysis, upload: &Upload, db: &'static str) -> Self {
        let meta = ReportMeta {
            rows_parsed: analysis.rows_parsed(),
            lines_total: analysis.lines_total(),
            country: upload.country.clone(),
            erp: upload.erp.clone(),
            db,
        };

        Self {
            report_id,
            scores: analysis.scores,
            coverage: analysis.coverage,
            rule_findings: analysis.findings,
            gaps: analysis.gaps,
            readiness: analysis.readiness,
            meta,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub rows_parsed: usize,
    pub lines_total: usize,
    pub country: Option<String>,
    pub erp: Option<String>,
    pub db: &'static str,
}

impl Upload {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Repository row for a report, with its retention window.
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub id: ReportId,
    pub upload_id: UploadId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub overall: u8,
    pub report: Report,
}

impl StoredReport {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            overall: self.overall,
        }
    }
}

/// Listing entry for recent reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: ReportId,
    pub created_at: DateTime<Utc>,
    pub overall: u8,
}
