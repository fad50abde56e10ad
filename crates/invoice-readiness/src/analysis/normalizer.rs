/// Canonical form used when comparing field names: lowercase with whitespace
/// and underscores removed.
pub(crate) fn normalize_key(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
