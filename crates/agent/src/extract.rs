use serde_json::Value;

use docket_core::intent::{AssistantReply, Intent};

/// Decodes a raw assistant reply into prose or an action intent.
///
/// Models wrap their payloads unpredictably: fenced blocks, lead-in prose,
/// trailing commentary. The decoder tries a fenced block first, then scans
/// for a balanced JSON object anywhere in the text. A reply with no decodable
/// `action`/`params` object is treated as plain conversation.
pub fn extract_reply(raw: &str) -> AssistantReply {
    if let Some((fence_start, payload)) = fenced_payload(raw) {
        if let Some(intent) = intent_from_json(payload, intro_before(raw, fence_start)) {
            return AssistantReply::Action { intent };
        }
    }

    let mut search_from = 0;
    while let Some(offset) = raw[search_from..].find('{') {
        let start = search_from + offset;
        let Some(length) = balanced_object(&raw[start..]) else {
            break;
        };
        if let Some(intent) =
            intent_from_json(&raw[start..start + length], intro_before(raw, start))
        {
            return AssistantReply::Action { intent };
        }
        search_from = start + 1;
    }

    let text = raw.trim();
    if text.is_empty() {
        // An empty completion still needs a visible turn.
        return AssistantReply::Message { text: "processing".to_string() };
    }
    AssistantReply::Message { text: text.to_string() }
}

/// Content of the first ``` block, with the opening tag line stripped.
fn fenced_payload(raw: &str) -> Option<(usize, &str)> {
    let open = raw.find("```")?;
    let rest = &raw[open + 3..];
    let content_start = rest.find('\n')? + 1;
    let content = &rest[content_start..];
    let close = content.find("```")?;
    Some((open, content[..close].trim()))
}

/// Byte length of the balanced object opening at the start of `text`. Braces
/// inside string literals do not count, including escaped quotes.
fn balanced_object(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn intro_before(raw: &str, start: usize) -> Option<String> {
    let intro = raw[..start].trim();
    if intro.is_empty() {
        None
    } else {
        Some(intro.to_string())
    }
}

fn intent_from_json(payload: &str, intro: Option<String>) -> Option<Intent> {
    let value: Value = serde_json::from_str(payload).ok()?;
    intent_from_value(&value, intro)
}

fn intent_from_value(value: &Value, intro: Option<String>) -> Option<Intent> {
    let object = value.as_object()?;
    let action = object.get("action")?.as_str()?.trim();
    if action.is_empty() {
        return None;
    }
    let raw_params = object.get("params")?.as_object()?;

    let mut intent = Intent::new(action);
    intent.intro_text = intro;

    for (key, value) in raw_params {
        match value {
            Value::String(text) => {
                intent.params.insert(key.clone(), text.clone());
            }
            Value::Number(number) => {
                intent.params.insert(key.clone(), number.to_string());
            }
            Value::Bool(flag) => {
                intent.params.insert(key.clone(), flag.to_string());
            }
            // Structured values are not parameters; chained follow-ups land here.
            Value::Object(_) | Value::Array(_) => {
                intent.metadata.insert(key.clone(), value.clone());
            }
            Value::Null => {}
        }
    }

    if let Some(metadata) = object.get("metadata").and_then(Value::as_object) {
        for (key, value) in metadata {
            intent.metadata.insert(key.clone(), value.clone());
        }
    }

    if let Some(flag) = object.get("requires_confirmation").and_then(Value::as_bool) {
        intent.requires_confirmation = flag;
    }

    if let Some(note) = object.get("message").and_then(Value::as_str) {
        let note = note.trim();
        if !note.is_empty() {
            intent.set_confirm_note(note);
        }
    }

    Some(intent)
}

#[cfg(test)]
mod tests {
    use docket_core::intent::{AssistantReply, META_FOLLOW_UP_CASE};

    use super::extract_reply;

    fn action(raw: &str) -> docket_core::intent::Intent {
        match extract_reply(raw) {
            AssistantReply::Action { intent } => intent,
            AssistantReply::Message { text } => panic!("expected action, got message: {text}"),
        }
    }

    #[test]
    fn decodes_a_fenced_block_and_keeps_the_intro() {
        let raw = "I'll set that up.\n```json\n{\"action\": \"create_event\", \"params\": {\"title\": \"Filing deadline\", \"event_date\": \"2026-09-01\"}}\n```";

        let intent = action(raw);
        assert_eq!(intent.action, "create_event");
        assert_eq!(intent.param("title"), Some("Filing deadline"));
        assert_eq!(intent.intro_text.as_deref(), Some("I'll set that up."));
    }

    #[test]
    fn decodes_bare_json_and_ignores_trailing_prose() {
        let raw = "{\"action\": \"list_cases\", \"params\": {}}\nLet me know if you need more.";

        let intent = action(raw);
        assert_eq!(intent.action, "list_cases");
        assert!(intent.params.is_empty());
        assert!(intent.intro_text.is_none());
    }

    #[test]
    fn plain_prose_is_a_message() {
        let reply = extract_reply("Good morning! How can I help with the practice today?");
        assert_eq!(
            reply,
            AssistantReply::Message {
                text: "Good morning! How can I help with the practice today?".to_string()
            }
        );
    }

    #[test]
    fn skips_brace_noise_before_the_real_payload() {
        let raw = "Use the {action} convention.\n{\"action\": \"list_hearings\", \"params\": {}}";

        let intent = action(raw);
        assert_eq!(intent.action, "list_hearings");
    }

    #[test]
    fn braces_inside_string_values_do_not_break_the_scan() {
        let raw = r#"{"action": "register_document", "params": {"title": "Brief {closing remarks}"}}"#;

        let intent = action(raw);
        assert_eq!(intent.param("title"), Some("Brief {closing remarks}"));
    }

    #[test]
    fn scalar_params_are_stringified() {
        let raw = r#"{"action": "create_event", "params": {"title": "Audit", "priority": 3, "urgent": true, "notes": null}}"#;

        let intent = action(raw);
        assert_eq!(intent.param("priority"), Some("3"));
        assert_eq!(intent.param("urgent"), Some("true"));
        assert_eq!(intent.param("notes"), None);
    }

    #[test]
    fn object_params_move_into_metadata() {
        let raw = r#"{"action": "create_client", "params": {"name": "Maria Rossi", "case": {"number": "123/2026", "title": "Rossi v. Lago"}}}"#;

        let intent = action(raw);
        assert_eq!(intent.param("name"), Some("Maria Rossi"));
        assert!(intent.param("case").is_none());
        let case = intent.metadata.get(META_FOLLOW_UP_CASE).expect("follow-up object");
        assert_eq!(case["number"], "123/2026");
    }

    #[test]
    fn message_field_becomes_the_confirmation_note() {
        let raw = r#"{"action": "create_client", "params": {"name": "Maria Rossi"}, "message": "Register Maria Rossi as a client?"}"#;

        let intent = action(raw);
        assert_eq!(intent.confirm_note(), Some("Register Maria Rossi as a client?"));
        assert!(intent.requires_confirmation);
    }

    #[test]
    fn explicit_confirmation_opt_out_is_kept() {
        let raw = r#"{"action": "create_event", "params": {"title": "Audit"}, "requires_confirmation": false}"#;

        let intent = action(raw);
        assert!(!intent.requires_confirmation);
    }

    #[test]
    fn json_without_params_falls_back_to_prose() {
        let raw = r#"{"action": "create_client"}"#;

        let reply = extract_reply(raw);
        assert_eq!(reply, AssistantReply::Message { text: raw.to_string() });
    }

    #[test]
    fn unterminated_object_falls_back_to_prose() {
        let raw = "so the shape is { \"action\": ... and never closes";

        let reply = extract_reply(raw);
        assert!(matches!(reply, AssistantReply::Message { .. }));
    }

    #[test]
    fn an_empty_completion_becomes_a_placeholder() {
        let reply = extract_reply("   \n ");
        assert_eq!(reply, AssistantReply::Message { text: "processing".to_string() });
    }

    #[test]
    fn top_level_metadata_is_merged() {
        let raw = r#"{"action": "create_case", "params": {"number": "123/2026"}, "metadata": {"hearing": {"scheduled_for": "2026-09-12 09:30"}}}"#;

        let intent = action(raw);
        assert!(intent.metadata.contains_key("hearing"));
    }
}
