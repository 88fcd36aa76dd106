/// Canonical comparison key for a header: ASCII letters and digits only, lowercased.
pub fn normalize_header(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}
