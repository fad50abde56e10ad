use crate::infra::analysis_context;
use clap::Args;
use invoice_readiness::analysis::{Analysis, FindingDetail, Questionnaire, RuleFinding};
use invoice_readiness::config::AppConfig;
use invoice_readiness::error::AppError;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// CSV or JSON export to analyse
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Target schema to score against (defaults to APP_TARGET_SCHEMA or the bundled schema)
    #[arg(long)]
    pub(crate) schema: Option<PathBuf>,
    /// The integration consumes delivery webhooks
    #[arg(long)]
    pub(crate) webhooks: bool,
    /// A sandbox environment is available for certification
    #[arg(long)]
    pub(crate) sandbox_env: bool,
    /// Failed submissions are retried
    #[arg(long)]
    pub(crate) retries: bool,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        input,
        schema,
        webhooks,
        sandbox_env,
        retries,
        json,
    } = args;

    let mut config = AppConfig::load()?;
    if schema.is_some() {
        config.analysis.target_schema = schema;
    }
    let context = analysis_context(&config)?;

    let raw = std::fs::read_to_string(&input)?;
    let questionnaire = Questionnaire {
        webhooks,
        sandbox_env,
        retries,
    };
    let analysis = context.analyze(&raw, &questionnaire);

    println!(
        "{}",
        render_report(&input.display().to_string(), &analysis, json)?
    );
    Ok(())
}

/// Text or pretty JSON rendering; serialisation failures propagate to the caller.
pub(crate) fn render_report(
    source: &str,
    analysis: &Analysis,
    json: bool,
) -> Result<String, AppError> {
    if json {
        Ok(serde_json::to_string_pretty(analysis)?)
    } else {
        Ok(render_text(source, analysis))
    }
}

pub(crate) fn render_text(source: &str, analysis: &Analysis) -> String {
    let scores = &analysis.scores;
    let coverage = &analysis.coverage;
    let mut lines = vec![
        "E-invoicing readiness report".to_string(),
        format!(
            "Source: {source} ({} rows, {} line items)",
            analysis.rows_parsed(),
            analysis.lines_total()
        ),
        format!(
            "Overall: {}/100 ({})",
            scores.overall,
            analysis.readiness.label()
        ),
        format!(
            "- data {} | coverage {} | rules {} | posture {}",
            scores.data, scores.coverage, scores.rules, scores.posture
        ),
        format!(
            "\nSchema coverage: {} matched, {} missing, {} close",
            coverage.matched.len(),
            coverage.missing.len(),
            coverage.close.len()
        ),
    ];

    for close in &coverage.close {
        lines.push(format!(
            "  - {} ~ {} ({:.2})",
            close.target, close.candidate, close.confidence
        ));
    }

    lines.push("\nRule findings:".to_string());
    lines.extend(analysis.findings.iter().map(describe_finding));

    if analysis.gaps.is_empty() {
        lines.push("\nGaps: none".to_string());
    } else {
        lines.push("\nGaps:".to_string());
        lines.extend(analysis.gaps.iter().map(|gap| format!("  - {gap}")));
    }

    lines.join("\n")
}

fn describe_finding(finding: &RuleFinding) -> String {
    let code = finding.rule.code();
    if finding.ok {
        return format!("  - {code}: pass");
    }

    match &finding.detail {
        Some(FindingDetail::LineMismatch {
            example_line,
            expected,
            got,
        }) => format!(
            "  - {code}: fail (line {example_line}: expected {expected:.2}, got {got:.2})"
        ),
        Some(FindingDetail::ObservedValue { value: Some(value) }) => {
            format!("  - {code}: fail (value {value})")
        }
        _ => format!("  - {code}: fail"),
    }
}
