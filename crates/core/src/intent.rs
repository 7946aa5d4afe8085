use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Metadata key holding the text shown when asking the user to confirm.
pub const META_CONFIRM_NOTE: &str = "confirm_note";
/// Metadata key counting how many chained steps led to this intent.
pub const META_CHAIN_DEPTH: &str = "chain_depth";
/// Metadata key describing a case to create after its client exists.
pub const META_FOLLOW_UP_CASE: &str = "case";
/// Metadata key describing a hearing to create after its case exists.
pub const META_FOLLOW_UP_HEARING: &str = "hearing";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Which provider produced an assistant message, e.g. "openai" or "ollama".
    pub provider_tag: Option<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::User,
            text: text.into(),
            timestamp: Utc::now(),
            provider_tag: None,
        }
    }

    pub fn assistant(text: impl Into<String>, provider_tag: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            provider_tag,
        }
    }
}

/// A structured request for one backend action, decoded from an assistant reply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: String,
    pub params: BTreeMap<String, String>,
    pub requires_confirmation: bool,
    /// Structured extras that are not parameters: confirmation text, chained
    /// follow-up entities, chain depth.
    pub metadata: Map<String, Value>,
    /// Prose the model emitted before the structured payload, if any.
    pub intro_text: Option<String>,
}

impl Intent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: BTreeMap::new(),
            requires_confirmation: true,
            metadata: Map::new(),
            intro_text: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn confirm_note(&self) -> Option<&str> {
        self.metadata.get(META_CONFIRM_NOTE).and_then(Value::as_str)
    }

    pub fn set_confirm_note(&mut self, note: impl Into<String>) {
        self.metadata.insert(META_CONFIRM_NOTE.to_string(), Value::String(note.into()));
    }

    pub fn chain_depth(&self) -> u64 {
        self.metadata.get(META_CHAIN_DEPTH).and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn set_chain_depth(&mut self, depth: u64) {
        self.metadata.insert(META_CHAIN_DEPTH.to_string(), Value::from(depth));
    }

    /// Text presented alongside the confirm/cancel affordance.
    pub fn confirmation_text(&self) -> String {
        if let Some(note) = self.confirm_note() {
            return note.to_string();
        }

        if self.params.is_empty() {
            return format!("Ready to run `{}`. Confirm?", self.action);
        }

        let fields = self
            .params
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Ready to run `{}` with {fields}. Confirm?", self.action)
    }
}

/// One assistant turn after decoding: either plain prose or an action request.
#[derive(Clone, Debug, PartialEq)]
pub enum AssistantReply {
    Message { text: String },
    Action { intent: Intent },
}

/// Outcome of one executed action, shaped for display and for chaining.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ActionReport {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, data: None, error: None, message: Some(message.into()) }
    }

    pub fn ok_with_data(message: impl Into<String>, data: Value) -> Self {
        Self { success: true, data: Some(data), error: None, message: Some(message.into()) }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()), message: None }
    }

    /// Looks up a string field in the report data, e.g. a generated identifier.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.get(key)).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ActionReport, Intent};

    #[test]
    fn confirmation_text_prefers_the_attached_note() {
        let mut intent = Intent::new("create_case").with_param("number", "123/2026");
        intent.set_confirm_note("Open case 123/2026 for Maria Rossi?");

        assert_eq!(intent.confirmation_text(), "Open case 123/2026 for Maria Rossi?");
    }

    #[test]
    fn confirmation_text_falls_back_to_action_and_params() {
        let intent = Intent::new("create_event")
            .with_param("title", "filing deadline")
            .with_param("event_date", "2026-09-01");

        let text = intent.confirmation_text();
        assert!(text.contains("create_event"));
        assert!(text.contains("filing deadline"));
        assert!(text.contains("2026-09-01"));
    }

    #[test]
    fn chain_depth_defaults_to_zero() {
        let mut intent = Intent::new("create_client");
        assert_eq!(intent.chain_depth(), 0);

        intent.set_chain_depth(3);
        assert_eq!(intent.chain_depth(), 3);
    }

    #[test]
    fn report_data_lookup_reads_nested_strings() {
        let report = ActionReport::ok_with_data("done", json!({ "client_id": "abc-123" }));
        assert_eq!(report.data_str("client_id"), Some("abc-123"));
        assert_eq!(report.data_str("case_id"), None);
    }
}
