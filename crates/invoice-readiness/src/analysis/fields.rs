use super::FlatRecord;
use serde_json::Value;

/// Ordered candidate paths for one logical field; the first usable path wins.
pub(crate) type Aliases = &'static [&'static str];

pub(crate) const TOTAL_EXCL_VAT: Aliases = &["invoice.total_excl_vat", "total_excl_vat"];
pub(crate) const VAT_AMOUNT: Aliases = &["invoice.vat_amount", "vat_amount"];
pub(crate) const TOTAL_INCL_VAT: Aliases = &["invoice.total_incl_vat", "total_incl_vat"];
pub(crate) const ISSUE_DATE: Aliases = &["invoice.issue_date", "issue_date", "invoice_date"];
pub(crate) const CURRENCY: Aliases = &["invoice.currency", "currency"];
pub(crate) const BUYER_TRN: Aliases = &["buyer.trn", "buyer_trn", "buyer.trn_number"];
pub(crate) const SELLER_TRN: Aliases = &["seller.trn", "seller_trn", "seller.trn_number"];

pub(crate) const LINES: Aliases = &["lines"];
pub(crate) const LINE_QTY: Aliases = &["lines[].qty", "qty", "line_qty"];
pub(crate) const LINE_UNIT_PRICE: Aliases = &["lines[].unit_price", "unit_price"];
pub(crate) const LINE_TOTAL: Aliases = &["lines[].line_total", "line_total"];

/// First alias whose value is present, non-null, and not an empty string.
pub(crate) fn lookup<'a>(record: &'a FlatRecord, aliases: Aliases) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| record.get(*alias))
        .find(|value| is_present(value))
}

pub(crate) fn lookup_number(record: &FlatRecord, aliases: Aliases) -> Option<f64> {
    lookup(record, aliases).and_then(as_number)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

/// Finite numeric reading of a value; numeric strings are accepted.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

/// Text rendering used for code-like fields such as currency.
pub(crate) fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(value: Value) -> FlatRecord {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn lookup_skips_empty_and_null_aliases() {
        let record = flat(json!({
            "invoice.currency": "",
            "currency": "usd",
            "buyer.trn": null,
            "buyer_trn": "42"
        }));

        assert_eq!(lookup(&record, CURRENCY), Some(&json!("usd")));
        assert_eq!(lookup(&record, BUYER_TRN), Some(&json!("42")));
        assert_eq!(lookup(&record, SELLER_TRN), None);
    }

    #[test]
    fn first_present_alias_wins_even_when_not_numeric() {
        let record = flat(json!({ "invoice.vat_amount": "n/a", "vat_amount": 5 }));
        assert_eq!(lookup_number(&record, VAT_AMOUNT), None);
    }

    #[test]
    fn numbers_must_be_finite() {
        assert_eq!(as_number(&json!(12.5)), Some(12.5));
        assert_eq!(as_number(&json!(" 7 ")), Some(7.0));
        assert_eq!(as_number(&json!("1e2")), Some(100.0));
        assert_eq!(as_number(&json!("inf")), None);
        assert_eq!(as_number(&json!("NaN")), None);
        assert_eq!(as_number(&json!("twelve")), None);
        assert_eq!(as_number(&json!(true)), None);
        assert_eq!(as_number(&Value::Null), None);
    }

    #[test]
    fn text_rendering_keeps_strings_verbatim() {
        assert_eq!(as_text(&json!("usd")), "usd");
        assert_eq!(as_text(&json!(840)), "840");
    }
}
