use super::matcher::CoverageResult;
use super::rules::{FindingDetail, RuleFinding, RuleId};

/// Remediation list: one entry per missing target key, then one per failing
/// rule in rule order.
pub fn gaps(coverage: &CoverageResult, findings: &[RuleFinding]) -> Vec<String> {
    coverage
        .missing
        .iter()
        .map(|key| format!("Missing {key}"))
        .chain(findings.iter().filter_map(remediation))
        .collect()
}

fn remediation(finding: &RuleFinding) -> Option<String> {
    if finding.ok {
        return None;
    }

    let message = match finding.rule {
        RuleId::TotalsBalance => "Totals do not balance".to_string(),
        RuleId::LineMath => "Line total does not equal qty*unit_price".to_string(),
        RuleId::DateIso => "Invalid issue_date format".to_string(),
        RuleId::CurrencyAllowed => {
            let observed = match &finding.detail {
                Some(FindingDetail::ObservedValue { value: Some(value) }) => value.as_str(),
                _ => "null",
            };
            format!("Invalid currency {observed}")
        }
        RuleId::TrnPresent => "Missing TRN(s)".to_string(),
    };
    Some(message)
}
