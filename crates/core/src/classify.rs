use crate::intent::Intent;

/// Actions that only read from the record store. These run immediately and
/// never occupy the confirmation slot.
const READ_ONLY_ACTIONS: &[&str] = &[
    "search_clients",
    "search_cases",
    "search_documents",
    "list_cases",
    "list_hearings",
    "list_events",
    "get_case_summary",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Execute without asking. Read-only lookups and explicitly pre-approved intents.
    Auto,
    /// Park the intent and ask the user before touching the record store.
    ConfirmFirst,
}

pub fn is_read_only(action: &str) -> bool {
    READ_ONLY_ACTIONS.contains(&action)
}

pub fn classify(intent: &Intent) -> ExecutionMode {
    if is_read_only(&intent.action) {
        return ExecutionMode::Auto;
    }

    if intent.requires_confirmation {
        ExecutionMode::ConfirmFirst
    } else {
        ExecutionMode::Auto
    }
}
