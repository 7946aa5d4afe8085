use std::collections::BTreeMap;

/// Human-readable reading of a failed action, built without any model call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnosis {
    pub summary: String,
    pub suggestion: Option<String>,
    pub technical_detail: Option<String>,
}

impl Diagnosis {
    /// Flattens the parts into one chat message.
    pub fn to_message(&self) -> String {
        let mut message = self.summary.clone();
        if let Some(suggestion) = &self.suggestion {
            message.push_str("\nSuggestion: ");
            message.push_str(suggestion);
        }
        if let Some(detail) = &self.technical_detail {
            message.push_str("\nDetails: ");
            message.push_str(detail);
        }
        message
    }
}

/// Maps a raw executor error onto advice the user can act on. Rules are
/// checked most-specific first: action-aware rows, then generic error
/// classes, then a catch-all that preserves the raw text.
pub fn diagnose(action: &str, params: &BTreeMap<String, String>, raw_error: &str) -> Diagnosis {
    let lowered = raw_error.to_ascii_lowercase();

    if let Some(diagnosis) = action_specific(action, params, &lowered) {
        return diagnosis;
    }

    if is_not_found(&lowered) {
        return Diagnosis {
            summary: format!("`{action}` failed because a record it referred to was not found."),
            suggestion: Some("Check the spelling, or create the missing record first.".to_string()),
            technical_detail: Some(raw_error.to_string()),
        };
    }

    if is_duplicate(&lowered) {
        return Diagnosis {
            summary: format!("`{action}` failed because an equivalent record already exists."),
            suggestion: Some("Update the existing record instead of creating a new one.".to_string()),
            technical_detail: Some(raw_error.to_string()),
        };
    }

    if is_permission(&lowered) {
        return Diagnosis {
            summary: format!("`{action}` was blocked by a permission rule."),
            suggestion: Some("This account is not allowed to do that here.".to_string()),
            technical_detail: Some(raw_error.to_string()),
        };
    }

    if is_connectivity(&lowered) {
        return Diagnosis {
            summary: format!("`{action}` could not reach the record store."),
            suggestion: Some("Retry in a moment; the store looks unreachable.".to_string()),
            technical_detail: Some(raw_error.to_string()),
        };
    }

    if is_missing_field(&lowered) {
        return Diagnosis {
            summary: format!("`{action}` was missing information it needs."),
            suggestion: Some("Repeat the request with the missing detail filled in.".to_string()),
            technical_detail: Some(raw_error.to_string()),
        };
    }

    Diagnosis {
        summary: format!("`{action}` failed."),
        suggestion: None,
        technical_detail: Some(format!("{raw_error} (params: {})", render_params(params))),
    }
}

fn action_specific(
    action: &str,
    params: &BTreeMap<String, String>,
    lowered_error: &str,
) -> Option<Diagnosis> {
    match action {
        "create_hearing" if lowered_error.contains("case") && is_not_found(lowered_error) => {
            let case = param_any(params, &["case_number", "case_no", "case_id"])
                .unwrap_or("the referenced case");
            Some(Diagnosis {
                summary: format!("The hearing was not scheduled: case {case} was not found."),
                suggestion: Some(format!(
                    "Create case {case} first, or double-check the case number."
                )),
                technical_detail: None,
            })
        }
        "create_case" if lowered_error.contains("client") && is_not_found(lowered_error) => {
            let client = param_any(params, &["client_name", "client", "client_id"])
                .unwrap_or("the referenced client");
            Some(Diagnosis {
                summary: format!("The case was not opened: client {client} was not found."),
                suggestion: Some(format!("Register {client} as a client first.")),
                technical_detail: None,
            })
        }
        "register_document" | "draft_document"
            if lowered_error.contains("case") && is_not_found(lowered_error) =>
        {
            let case = param_any(params, &["case_number", "case_no", "case_id"])
                .unwrap_or("the referenced case");
            Some(Diagnosis {
                summary: format!("The document was not stored: case {case} was not found."),
                suggestion: Some("File it without a case, or create the case first.".to_string()),
                technical_detail: None,
            })
        }
        "create_case" if is_duplicate(lowered_error) => {
            let number = param_any(params, &["case_number", "case_no", "number"])
                .unwrap_or("that number");
            Some(Diagnosis {
                summary: format!("A case with number {number} already exists."),
                suggestion: Some("Use update_case to change it, or pick another number.".to_string()),
                technical_detail: None,
            })
        }
        _ => None,
    }
}

fn param_any<'a>(params: &'a BTreeMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| params.get(*key).map(String::as_str))
}

fn render_params(params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return "none".to_string();
    }
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_not_found(lowered: &str) -> bool {
    lowered.contains("not found") || lowered.contains("no rows") || lowered.contains("does not exist")
}

fn is_duplicate(lowered: &str) -> bool {
    lowered.contains("already exists")
        || lowered.contains("unique constraint")
        || lowered.contains("duplicate")
}

fn is_permission(lowered: &str) -> bool {
    lowered.contains("permission")
        || lowered.contains("denied")
        || lowered.contains("forbidden")
        || lowered.contains("unauthorized")
        || lowered.contains("policy")
}

fn is_connectivity(lowered: &str) -> bool {
    lowered.contains("timeout")
        || lowered.contains("timed out")
        || lowered.contains("connection")
        || lowered.contains("connect")
        || lowered.contains("unreachable")
        || lowered.contains("network")
}

fn is_missing_field(lowered: &str) -> bool {
    lowered.contains("missing") || lowered.contains("required parameter")
}
