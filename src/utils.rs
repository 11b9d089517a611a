//! Text normalization helpers shared by the tier normalizer and the sampler.

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// Uppercased, whitespace-collapsed form used for case-insensitive label
/// matching and for grouping keys.
pub fn canonical_label<T: AsRef<str>>(text: T) -> String {
    normalize_inline_whitespace(text).to_uppercase()
}

/// Case-insensitive substring test against any of `markers`.
///
/// `label` must already be in [`canonical_label`] form; markers are uppercase.
pub fn contains_any(label: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| label.contains(marker))
}
