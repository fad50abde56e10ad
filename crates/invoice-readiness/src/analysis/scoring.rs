use super::matcher::CoverageResult;
use super::rules::{RuleFinding, RULE_COUNT};
use super::schema::{is_header_key, TargetKeys};
use super::Record;
use serde::{Deserialize, Serialize};

const DATA_WEIGHT: f64 = 0.25;
const COVERAGE_WEIGHT: f64 = 0.35;
const RULES_WEIGHT: f64 = 0.30;
const POSTURE_WEIGHT: f64 = 0.10;

const HEADER_COVERAGE_WEIGHT: f64 = 0.7;
const LINE_COVERAGE_WEIGHT: f64 = 0.3;

/// Self-reported integration posture supplied alongside an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    #[serde(default)]
    pub webhooks: bool,
    #[serde(default)]
    pub sandbox_env: bool,
    #[serde(default)]
    pub retries: bool,
}

impl Questionnaire {
    fn yes_count(&self) -> usize {
        [self.webhooks, self.sandbox_env, self.retries]
            .into_iter()
            .filter(|answer| *answer)
            .count()
    }
}

/// Component and composite scores, each within `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scores {
    pub data: u8,
    pub coverage: u8,
    pub rules: u8,
    pub posture: u8,
    pub overall: u8,
}

/// Qualitative tier derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Readiness {
    High,
    Medium,
    Low,
}

impl Readiness {
    pub const fn from_overall(overall: u8) -> Self {
        if overall >= 80 {
            Self::High
        } else if overall >= 50 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

pub fn score(
    records: &[Record],
    targets: &TargetKeys,
    coverage: &CoverageResult,
    findings: &[RuleFinding],
    questionnaire: &Questionnaire,
) -> Scores {
    let data = if records.is_empty() { 0 } else { 100 };
    let coverage = coverage_score(targets, coverage);

    let passed = findings.iter().filter(|finding| finding.ok).count();
    let rules = percent(100.0 * passed as f64 / RULE_COUNT as f64);
    let posture = percent(100.0 * questionnaire.yes_count() as f64 / 3.0);

    Scores {
        data,
        coverage,
        rules,
        posture,
        overall: blend(data, coverage, rules, posture),
    }
}

/// Weighted composite of the four component scores.
pub fn blend(data: u8, coverage: u8, rules: u8, posture: u8) -> u8 {
    percent(
        f64::from(data) * DATA_WEIGHT
            + f64::from(coverage) * COVERAGE_WEIGHT
            + f64::from(rules) * RULES_WEIGHT
            + f64::from(posture) * POSTURE_WEIGHT,
    )
}

fn coverage_score(targets: &TargetKeys, coverage: &CoverageResult) -> u8 {
    if targets.is_empty() {
        return 0;
    }

    let header_total = targets.header_count();
    let line_total = targets.len() - header_total;
    let matched_header = coverage
        .matched
        .iter()
        .filter(|key| is_header_key(key))
        .count();
    let matched_line = coverage.matched.len() - matched_header;

    let header_ratio = matched_header as f64 / header_total.max(1) as f64;
    let line_ratio = matched_line as f64 / line_total.max(1) as f64;
    percent(100.0 * (header_ratio * HEADER_COVERAGE_WEIGHT + line_ratio * LINE_COVERAGE_WEIGHT))
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
