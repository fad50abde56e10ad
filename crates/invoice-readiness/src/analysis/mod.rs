//! Readiness analysis of an e-invoicing export.
//!
//! Raw text is decoded into records, matched against the canonical target
//! schema, checked against the business rules, and rolled up into scores and a
//! remediation list. Everything here is synchronous and free of shared mutable
//! state; the only long-lived input is the [`AnalysisContext`].

pub mod decoder;
mod fields;
pub mod flatten;
pub mod gaps;
pub mod matcher;
mod normalizer;
pub mod preview;
pub mod rules;
pub mod schema;
pub mod scoring;

pub use decoder::{decode, MAX_RECORDS};
pub use flatten::flatten;
pub use gaps::gaps;
pub use matcher::{detect_coverage, match_all, similarity, CloseMatch, CoverageResult};
pub use preview::{preview, ColumnType, TablePreview};
pub use rules::{evaluate, FindingDetail, RuleFinding, RuleId};
pub use schema::{SchemaError, TargetKeys};
pub use scoring::{Questionnaire, Readiness, Scores};

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// A decoded input row. Key order follows the source document.
pub type Record = Map<String, Value>;

/// A record whose nested objects have been collapsed into dotted keys.
pub type FlatRecord = Map<String, Value>;

/// Immutable state shared by every analysis: the canonical target keys.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    target_keys: TargetKeys,
}

impl AnalysisContext {
    pub fn new(target_keys: TargetKeys) -> Self {
        Self { target_keys }
    }

    /// Load the target schema from `path`, or the bundled schema when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, SchemaError> {
        let target_keys = match path {
            Some(path) => TargetKeys::from_path(path)?,
            None => TargetKeys::bundled()?,
        };
        Ok(Self::new(target_keys))
    }

    pub fn target_keys(&self) -> &TargetKeys {
        &self.target_keys
    }

    pub fn analyze(&self, raw: &str, questionnaire: &Questionnaire) -> Analysis {
        let records = decode(raw);
        let coverage = detect_coverage(&records, &self.target_keys);
        let findings = evaluate(&records);
        let scores = scoring::score(
            &records,
            &self.target_keys,
            &coverage,
            &findings,
            questionnaire,
        );
        let readiness = Readiness::from_overall(scores.overall);
        let gaps = gaps(&coverage, &findings);

        debug!(
            records = records.len(),
            matched = coverage.matched.len(),
            overall = scores.overall,
            "analysis finished"
        );

        Analysis {
            records,
            coverage,
            findings,
            scores,
            readiness,
            gaps,
        }
    }
}

/// Result of analysing one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(skip)]
    pub records: Vec<Record>,
    pub scores: Scores,
    pub coverage: CoverageResult,
    #[serde(rename = "ruleFindings")]
    pub findings: Vec<RuleFinding>,
    pub gaps: Vec<String>,
    pub readiness: Readiness,
}

impl Analysis {
    pub fn rows_parsed(&self) -> usize {
        self.records.len()
    }

    /// Total number of nested line items across all records.
    pub fn lines_total(&self) -> usize {
        self.records
            .iter()
            .filter_map(|record| record.get("lines").and_then(Value::as_array))
            .map(Vec::len)
            .sum()
    }
}
