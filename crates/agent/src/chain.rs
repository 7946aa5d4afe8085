//! Follow-up intents carried inside a parent's metadata.
//!
//! A composite request like "register Maria Rossi and open case 123/2026 for
//! her" arrives as one intent with the case nested under the client params.
//! After the parent action succeeds, the nested object becomes the next
//! proposal, with the parent's generated identifiers injected so the child
//! never has to look them up by name again. Every step is parked for its own
//! confirmation; the user can decline mid-chain and keep what already ran.

use serde_json::{Map, Value};
use tracing::warn;

use docket_core::intent::{ActionReport, Intent, META_FOLLOW_UP_CASE, META_FOLLOW_UP_HEARING};

/// A chain stops unrolling here even if deeper objects are nested. Two levels
/// (client -> case -> hearing) is the deepest shape the prompt teaches, so
/// anything past five is a model runaway.
pub const MAX_CHAIN_DEPTH: u64 = 5;

/// The follow-up to run after `parent` completed with `report`, if any.
/// Failed parents never chain; the partial state is reported instead.
pub fn next_intent(parent: &Intent, report: &ActionReport) -> Option<Intent> {
    if !report.success {
        return None;
    }

    let (action, object) = if let Some(object) = nested_object(parent, META_FOLLOW_UP_CASE) {
        ("create_case", object)
    } else if let Some(object) = nested_object(parent, META_FOLLOW_UP_HEARING) {
        ("create_hearing", object)
    } else {
        return None;
    };

    let depth = parent.chain_depth() + 1;
    if depth > MAX_CHAIN_DEPTH {
        warn!(action, depth, "chain.depth_exhausted");
        return None;
    }

    let mut child = child_from_object(action, object);
    child.set_chain_depth(depth);

    match action {
        "create_case" => {
            if let Some(client_id) = report.data_str("client_id") {
                child
                    .params
                    .entry("client_id".to_string())
                    .or_insert_with(|| client_id.to_string());
            }
        }
        "create_hearing" => {
            if let Some(case_id) = report.data_str("case_id") {
                child
                    .params
                    .entry("case_id".to_string())
                    .or_insert_with(|| case_id.to_string());
            }
            if let Some(case_number) = report.data_str("case_number") {
                child
                    .params
                    .entry("case_number".to_string())
                    .or_insert_with(|| case_number.to_string());
            }
        }
        _ => {}
    }

    Some(child)
}

fn nested_object<'a>(parent: &'a Intent, key: &str) -> Option<&'a Map<String, Value>> {
    parent.metadata.get(key).and_then(Value::as_object)
}

/// Scalars become params; nested objects ride along as the child's own
/// follow-ups. The child keeps the mutation default and asks for its own yes.
fn child_from_object(action: &str, object: &Map<String, Value>) -> Intent {
    let mut child = Intent::new(action);

    for (key, value) in object {
        match value {
            Value::String(text) => {
                child.params.insert(key.clone(), text.clone());
            }
            Value::Number(_) | Value::Bool(_) => {
                child.params.insert(key.clone(), value.to_string());
            }
            Value::Object(_) | Value::Array(_) => {
                child.metadata.insert(key.clone(), value.clone());
            }
            Value::Null => {}
        }
    }

    child
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use docket_core::intent::{ActionReport, Intent};

    use super::{next_intent, MAX_CHAIN_DEPTH};

    fn parent_with_case() -> Intent {
        let mut parent = Intent::new("create_client").with_param("name", "Maria Rossi");
        parent
            .metadata
            .insert("case".to_string(), json!({ "number": "123/2026", "title": "Rossi v. Lago" }));
        parent
    }

    #[test]
    fn a_successful_client_spawns_its_case_with_the_generated_id() {
        let parent = parent_with_case();
        let report = ActionReport::ok_with_data(
            "Registered client Maria Rossi.",
            json!({ "client_id": "6f8f57715090da2632453988d9a1501b" }),
        );

        let child = next_intent(&parent, &report).expect("follow-up");
        assert_eq!(child.action, "create_case");
        assert_eq!(child.param("number"), Some("123/2026"));
        assert_eq!(child.param("client_id"), Some("6f8f57715090da2632453988d9a1501b"));
        assert_eq!(child.chain_depth(), 1);
        assert!(child.requires_confirmation, "a chained step asks for its own confirmation");
    }

    #[test]
    fn an_explicit_child_param_wins_over_the_injected_one() {
        let mut parent = Intent::new("create_client").with_param("name", "Maria Rossi");
        parent.metadata.insert(
            "case".to_string(),
            json!({ "number": "123/2026", "client_id": "explicit-id" }),
        );
        let report =
            ActionReport::ok_with_data("done", json!({ "client_id": "generated-id" }));

        let child = next_intent(&parent, &report).expect("follow-up");
        assert_eq!(child.param("client_id"), Some("explicit-id"));
    }

    #[test]
    fn a_case_report_spawns_its_hearing_with_number_and_id() {
        let mut parent = Intent::new("create_case").with_param("number", "123/2026");
        parent
            .metadata
            .insert("hearing".to_string(), json!({ "scheduled_for": "2026-09-12 09:30" }));
        let report = ActionReport::ok_with_data(
            "Opened case 123/2026.",
            json!({ "case_id": "abc", "case_number": "123/2026" }),
        );

        let child = next_intent(&parent, &report).expect("follow-up");
        assert_eq!(child.action, "create_hearing");
        assert_eq!(child.param("case_id"), Some("abc"));
        assert_eq!(child.param("case_number"), Some("123/2026"));
    }

    #[test]
    fn a_nested_hearing_object_rides_along_on_the_case_child() {
        let mut parent = Intent::new("create_client").with_param("name", "Maria Rossi");
        parent.metadata.insert(
            "case".to_string(),
            json!({
                "number": "123/2026",
                "hearing": { "scheduled_for": "2026-09-12 09:30" },
            }),
        );
        let report = ActionReport::ok_with_data("done", json!({ "client_id": "abc" }));

        let child = next_intent(&parent, &report).expect("follow-up");
        assert!(child.metadata.get("hearing").is_some());

        let case_report =
            ActionReport::ok_with_data("done", json!({ "case_id": "def", "case_number": "123/2026" }));
        let grandchild = next_intent(&child, &case_report).expect("second follow-up");
        assert_eq!(grandchild.action, "create_hearing");
        assert_eq!(grandchild.param("scheduled_for"), Some("2026-09-12 09:30"));
        assert_eq!(grandchild.chain_depth(), 2);
    }

    #[test]
    fn the_chain_stops_at_the_depth_bound() {
        let mut parent = parent_with_case();
        parent.set_chain_depth(MAX_CHAIN_DEPTH);
        let report = ActionReport::ok_with_data("done", json!({ "client_id": "abc" }));

        assert!(next_intent(&parent, &report).is_none());
    }

    #[test]
    fn a_failed_parent_never_chains() {
        let parent = parent_with_case();
        let report = ActionReport::failed("client already exists (unique constraint)");

        assert!(next_intent(&parent, &report).is_none());
    }

    #[test]
    fn a_parent_without_nested_objects_ends_the_turn() {
        let parent = Intent::new("create_client").with_param("name", "Maria Rossi");
        let report = ActionReport::ok("Registered client Maria Rossi.");

        assert!(next_intent(&parent, &report).is_none());
    }
}
