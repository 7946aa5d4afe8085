use std::collections::BTreeMap;

/// Spelling pairs the model and the executor disagree on. Normalization fills
/// whichever side is missing so handlers can read either name.
const ALIAS_PAIRS: &[(&str, &str)] = &[
    ("document_number", "doc_number"),
    ("event_date", "date"),
    ("case_number", "case_no"),
    ("tax_id", "tax_code"),
];

/// Copies values across alias pairs in both directions. Existing values are
/// never overwritten, so the pass is idempotent.
pub fn normalize_params(params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut normalized = params.clone();

    for (left, right) in ALIAS_PAIRS {
        match (params.get(*left), params.get(*right)) {
            (Some(value), None) => {
                normalized.insert((*right).to_string(), value.clone());
            }
            (None, Some(value)) => {
                normalized.insert((*left).to_string(), value.clone());
            }
            _ => {}
        }
    }

    normalized
}
