use super::flatten::flatten;
use super::normalizer::normalize_key;
use super::schema::TargetKeys;
use super::Record;
use serde::Serialize;

/// Similarity at or above which a target counts as matched.
pub const MATCH_THRESHOLD: f64 = 0.9;
/// Similarity at or above which an unmatched target is reported as a close match.
pub const CLOSE_THRESHOLD: f64 = 0.6;

const PREFIX_SCORE: f64 = 0.8;
const CONTAINS_SCORE: f64 = 0.6;

/// Outcome of matching observed columns against the target schema.
///
/// `matched` and `missing` partition the target keys; `close` annotates some of
/// the missing keys with their best medium-confidence candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageResult {
    pub matched: Vec<String>,
    pub close: Vec<CloseMatch>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloseMatch {
    pub target: String,
    pub candidate: String,
    pub confidence: f64,
}

/// Score how alike two field names are, in `[0, 1]`.
///
/// Rules are checked in order and the first one that applies wins: exact match
/// after normalisation, prefix, substring, then normalised edit distance.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize_key(a);
    let b = normalize_key(b);

    if a == b {
        return 1.0;
    }
    if a.starts_with(&b) || b.starts_with(&a) {
        return PREFIX_SCORE;
    }
    if a.contains(&b) || b.contains(&a) {
        return CONTAINS_SCORE;
    }

    let longest = a.chars().count().max(b.chars().count()).max(1);
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

/// Union of flattened keys across all records, in first-seen order.
pub fn observed_columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in flatten(record).keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Coverage of the target schema by the columns observed in `records`.
pub fn detect_coverage(records: &[Record], targets: &TargetKeys) -> CoverageResult {
    if records.is_empty() {
        return CoverageResult {
            missing: targets.as_slice().to_vec(),
            ..CoverageResult::default()
        };
    }

    match_all(&observed_columns(records), targets)
}

/// Greedy best match per target key.
///
/// Each target is scored against every observed column independently and keeps
/// the first column with the highest score, so one column can serve several
/// targets.
pub fn match_all(observed: &[String], targets: &TargetKeys) -> CoverageResult {
    let mut coverage = CoverageResult::default();

    for target in targets.iter() {
        let mut best: Option<(&str, f64)> = None;
        for column in observed {
            let score = similarity(column, target);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((column.as_str(), score));
            }
        }

        match best {
            Some((_, score)) if score >= MATCH_THRESHOLD => {
                coverage.matched.push(target.to_string());
            }
            Some((candidate, score)) if score >= CLOSE_THRESHOLD => {
                coverage.close.push(CloseMatch {
                    target: target.to_string(),
                    candidate: candidate.to_string(),
                    confidence: (score * 100.0).round() / 100.0,
                });
                coverage.missing.push(target.to_string());
            }
            _ => coverage.missing.push(target.to_string()),
        }
    }

    coverage
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn targets(keys: &[&str]) -> TargetKeys {
        TargetKeys::new(keys.iter().map(|key| key.to_string()).collect())
    }

    fn columns(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|key| key.to_string()).collect()
    }

    #[test]
    fn levenshtein_counts_unit_edits() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abd"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn similarity_is_reflexive() {
        for name in ["invoice.currency", "", "Buyer TRN", "lines[].qty"] {
            assert_eq!(similarity(name, name), 1.0);
        }
    }

    #[test]
    fn similarity_applies_rules_in_priority_order() {
        assert_eq!(similarity("Total_Excl_VAT", "total excl vat"), 1.0);
        assert_eq!(similarity("invoice.currency", "invoice.curr"), 0.8);
        assert_eq!(similarity("seller.trn", "trn"), 0.6);
        assert_eq!(similarity("currency", "currency_code"), 0.8);

        let score = similarity("vat_amount", "vat_amnt");
        assert!((score - (1.0 - 2.0 / 9.0)).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn edit_distance_branch_is_symmetric() {
        let pairs = [("buyer.name", "seller.name"), ("qty", "quantity"), ("abc", "xyz")];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn match_all_classifies_by_threshold() {
        let coverage = match_all(
            &columns(&["invoice.currency", "seller.trn_no", "memo"]),
            &targets(&["invoice.currency", "seller.trn", "buyer.trn"]),
        );

        assert_eq!(coverage.matched, vec!["invoice.currency"]);
        assert_eq!(
            coverage.close,
            vec![CloseMatch {
                target: "seller.trn".to_string(),
                candidate: "seller.trn_no".to_string(),
                confidence: 0.8,
            }]
        );
        assert_eq!(coverage.missing, vec!["seller.trn", "buyer.trn"]);
    }

    #[test]
    fn first_seen_column_wins_ties_and_columns_are_reused() {
        let coverage = match_all(
            &columns(&["currencycode", "currency_code"]),
            &targets(&["currency", "currency_cd"]),
        );

        assert_eq!(coverage.close.len(), 2);
        assert!(coverage
            .close
            .iter()
            .all(|close| close.candidate == "currencycode"));
    }

    #[test]
    fn coverage_partitions_targets() {
        let keys = TargetKeys::bundled().expect("bundled schema");
        let records = vec![json!({
            "invoice": { "currency": "USD", "issue_date": "2024-01-01", "vat": 5 },
            "seller": { "trn": "1" },
            "qty": 2
        })
        .as_object()
        .cloned()
        .expect("object")];

        let coverage = detect_coverage(&records, &keys);

        let mut union: Vec<String> = coverage
            .matched
            .iter()
            .chain(coverage.missing.iter())
            .cloned()
            .collect();
        union.sort();
        let mut expected = keys.as_slice().to_vec();
        expected.sort();
        assert_eq!(union, expected);
        assert!(coverage
            .matched
            .iter()
            .all(|key| !coverage.missing.contains(key)));
        assert!(coverage
            .close
            .iter()
            .all(|close| !coverage.matched.contains(&close.target)));
    }

    #[test]
    fn no_records_means_everything_missing() {
        let keys = TargetKeys::bundled().expect("bundled schema");
        let coverage = detect_coverage(&[], &keys);

        assert!(coverage.matched.is_empty());
        assert!(coverage.close.is_empty());
        assert_eq!(coverage.missing, keys.as_slice());
    }

    #[test]
    fn observed_columns_keep_first_seen_order() {
        let records: Vec<Record> = [json!({ "b": 1, "a": { "x": 1 } }), json!({ "c": 1, "b": 2 })]
            .into_iter()
            .filter_map(|value| value.as_object().cloned())
            .collect();

        assert_eq!(observed_columns(&records), vec!["b", "a.x", "c"]);
    }
}
