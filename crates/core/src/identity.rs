use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Param names checked before falling back to a full-value scan.
const TAX_ID_FIELDS: &[&str] = &["tax_id", "tax_code", "national_id"];

fn tax_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b\d{2}[-. ]?\d{8}[-. ]?\d\b").expect("tax id regex must compile")
    })
}

/// Canonicalizes a tax identifier to the hyphenated `NN-NNNNNNNN-N` form.
/// Accepts bare digit runs and common separator variants. Anything that does
/// not reduce to exactly eleven digits is rejected.
pub fn normalize_tax_id(raw: &str) -> Option<String> {
    let digits: String =
        raw.chars().filter(|c| !matches!(c, '-' | '.' | ' ')).collect();
    if digits.len() != 11 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(format!("{}-{}-{}", &digits[0..2], &digits[2..10], &digits[10..11]))
}

/// Finds the first tax identifier embedded in free text.
pub fn find_tax_id(text: &str) -> Option<String> {
    tax_id_pattern().find(text).and_then(|m| normalize_tax_id(m.as_str()))
}

/// Resolves a tax identifier from an intent's parameters: the dedicated
/// fields first, then a pattern scan over every value in key order.
pub fn tax_id_from_params(params: &BTreeMap<String, String>) -> Option<String> {
    for field in TAX_ID_FIELDS {
        if let Some(value) = params.get(*field) {
            if let Some(tax_id) = normalize_tax_id(value).or_else(|| find_tax_id(value)) {
                return Some(tax_id);
            }
        }
    }

    params.values().find_map(|value| find_tax_id(value))
}
