use super::fields::{self, Aliases};
use super::flatten::flatten;
use super::{FlatRecord, Record};
use serde::Serialize;
use serde_json::Value;

/// Currencies accepted by the target e-invoicing programmes.
pub const ALLOWED_CURRENCIES: [&str; 4] = ["AED", "SAR", "MYR", "USD"];

/// Absolute tolerance, in currency units, for totals and line arithmetic.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

const ITEM_QTY: Aliases = &["qty"];
const ITEM_UNIT_PRICE: Aliases = &["unit_price"];
const ITEM_TOTAL: Aliases = &["line_total"];

/// Business rules evaluated for every document, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    TotalsBalance,
    LineMath,
    DateIso,
    CurrencyAllowed,
    TrnPresent,
}

impl RuleId {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::TotalsBalance,
            Self::LineMath,
            Self::DateIso,
            Self::CurrencyAllowed,
            Self::TrnPresent,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::TotalsBalance => "TOTALS_BALANCE",
            Self::LineMath => "LINE_MATH",
            Self::DateIso => "DATE_ISO",
            Self::CurrencyAllowed => "CURRENCY_ALLOWED",
            Self::TrnPresent => "TRN_PRESENT",
        }
    }
}

/// Number of rules in the fixed rule set.
pub const RULE_COUNT: usize = RuleId::ordered().len();

/// Pass/fail result for one rule, with diagnostics on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleFinding {
    pub rule: RuleId,
    pub ok: bool,
    #[serde(flatten)]
    pub detail: Option<FindingDetail>,
}

impl RuleFinding {
    fn passed(rule: RuleId) -> Self {
        Self {
            rule,
            ok: true,
            detail: None,
        }
    }

    fn failed(rule: RuleId, detail: Option<FindingDetail>) -> Self {
        Self {
            rule,
            ok: false,
            detail,
        }
    }

    fn check(rule: RuleId, ok: bool) -> Self {
        if ok {
            Self::passed(rule)
        } else {
            Self::failed(rule, None)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FindingDetail {
    /// First line whose total disagrees with `qty * unit_price`.
    LineMismatch {
        #[serde(rename = "exampleLine")]
        example_line: usize,
        expected: f64,
        got: f64,
    },
    /// Offending value as observed; `None` when nothing was supplied.
    ObservedValue { value: Option<String> },
}

/// Run every rule against the document. Rules are independent and never fail
/// hard: missing or unusable data turns into a failing finding.
pub fn evaluate(records: &[Record]) -> Vec<RuleFinding> {
    let flat: Vec<FlatRecord> = records.iter().map(flatten).collect();
    let empty = FlatRecord::new();
    let first = flat.first().unwrap_or(&empty);

    vec![
        totals_balance(first),
        line_math(first, &flat),
        date_iso(first),
        currency_allowed(first),
        trn_present(first),
    ]
}

fn totals_balance(first: &FlatRecord) -> RuleFinding {
    let excl = fields::lookup_number(first, fields::TOTAL_EXCL_VAT);
    let vat = fields::lookup_number(first, fields::VAT_AMOUNT);
    let incl = fields::lookup_number(first, fields::TOTAL_INCL_VAT);

    let ok = match (excl, vat, incl) {
        (Some(excl), Some(vat), Some(incl)) => (excl + vat - incl).abs() <= AMOUNT_TOLERANCE,
        _ => false,
    };
    RuleFinding::check(RuleId::TotalsBalance, ok)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LineItem {
    qty: Option<f64>,
    unit_price: Option<f64>,
    line_total: Option<f64>,
    /// 1-based record number for lines assembled from flat rows.
    row: Option<usize>,
}

impl LineItem {
    fn from_value(value: &Value) -> Self {
        let number = |aliases: Aliases| {
            value
                .as_object()
                .and_then(|object| fields::lookup_number(object, aliases))
        };
        Self {
            qty: number(ITEM_QTY),
            unit_price: number(ITEM_UNIT_PRICE),
            line_total: number(ITEM_TOTAL),
            row: None,
        }
    }

    fn from_row(record: &FlatRecord, row: usize) -> Option<Self> {
        let item = Self {
            qty: fields::lookup_number(record, fields::LINE_QTY),
            unit_price: fields::lookup_number(record, fields::LINE_UNIT_PRICE),
            line_total: fields::lookup_number(record, fields::LINE_TOTAL),
            row: Some(row),
        };
        let any_present =
            item.qty.is_some() || item.unit_price.is_some() || item.line_total.is_some();
        any_present.then_some(item)
    }
}

fn collect_lines(first: &FlatRecord, flat: &[FlatRecord]) -> Vec<LineItem> {
    if let Some(Value::Array(lines)) = fields::lookup(first, fields::LINES) {
        if !lines.is_empty() {
            return lines.iter().map(LineItem::from_value).collect();
        }
    }

    flat.iter()
        .enumerate()
        .filter_map(|(idx, record)| LineItem::from_row(record, idx + 1))
        .collect()
}

fn line_math(first: &FlatRecord, flat: &[FlatRecord]) -> RuleFinding {
    for (idx, line) in collect_lines(first, flat).into_iter().enumerate() {
        let (Some(qty), Some(unit_price), Some(got)) = (line.qty, line.unit_price, line.line_total)
        else {
            continue;
        };

        let expected = round_cents(qty * unit_price);
        if (expected - got).abs() > AMOUNT_TOLERANCE {
            return RuleFinding::failed(
                RuleId::LineMath,
                Some(FindingDetail::LineMismatch {
                    example_line: line.row.unwrap_or(idx + 1),
                    expected,
                    got,
                }),
            );
        }
    }

    RuleFinding::passed(RuleId::LineMath)
}

fn date_iso(first: &FlatRecord) -> RuleFinding {
    let ok = matches!(
        fields::lookup(first, fields::ISSUE_DATE),
        Some(Value::String(date)) if is_iso_date_shape(date)
    );
    RuleFinding::check(RuleId::DateIso, ok)
}

/// `YYYY-MM-DD` by shape only; calendar validity is not checked.
pub(crate) fn is_iso_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

fn currency_allowed(first: &FlatRecord) -> RuleFinding {
    let observed =
        fields::lookup(first, fields::CURRENCY).map(|value| fields::as_text(value).to_uppercase());

    match observed {
        Some(code) if ALLOWED_CURRENCIES.contains(&code.as_str()) => {
            RuleFinding::passed(RuleId::CurrencyAllowed)
        }
        other => RuleFinding::failed(
            RuleId::CurrencyAllowed,
            Some(FindingDetail::ObservedValue {
                value: other.filter(|code| !code.is_empty()),
            }),
        ),
    }
}

fn trn_present(first: &FlatRecord) -> RuleFinding {
    let buyer = fields::lookup(first, fields::BUYER_TRN);
    let seller = fields::lookup(first, fields::SELLER_TRN);
    RuleFinding::check(RuleId::TrnPresent, buyer.is_some() && seller.is_some())
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
