use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use docket_core::config::AnthropicConfig;
use docket_core::intent::{ChatMessage, ChatRole};

use super::LlmClient;

const BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<RequestMessage>,
}

#[derive(Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    /// Returns `None` when the backend is listed but no API key is set.
    pub fn from_config(config: &AnthropicConfig, timeout_secs: u64) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.as_ref() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building anthropic http client")?;

        Ok(Some(Self {
            client,
            api_key: api_key.expose_secret().to_string(),
            model: config.model.clone(),
        }))
    }

    fn headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("x-api-key", &self.api_key).header("anthropic-version", API_VERSION)
    }
}

/// The messages endpoint rejects consecutive turns with the same role and
/// transcripts that open on the assistant side. Merge runs of one role and
/// drop any assistant text before the first user turn.
fn coalesce(history: &[ChatMessage], user_text: &str) -> Vec<RequestMessage> {
    let mut messages: Vec<RequestMessage> = Vec::new();

    for (role, text) in history
        .iter()
        .map(|m| (m.role, m.text.as_str()))
        .chain(std::iter::once((ChatRole::User, user_text)))
    {
        if messages.is_empty() && role == ChatRole::Assistant {
            continue;
        }
        match messages.last_mut() {
            Some(last) if last.role == role.as_str() => {
                last.content.push_str("\n\n");
                last.content.push_str(text);
            }
            _ => messages.push(RequestMessage { role: role.as_str(), content: text.to_string() }),
        }
    }

    messages
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn tag(&self) -> &'static str {
        "anthropic"
    }

    async fn probe(&self) -> Result<()> {
        let response =
            self.headers(self.client.get(format!("{BASE_URL}/v1/models"))).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Anthropic probe failed with status {}", response.status()));
        }
        Ok(())
    }

    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_text: &str,
    ) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system_prompt.to_string(),
            messages: coalesce(history, user_text),
        };

        let response = self
            .headers(self.client.post(format!("{BASE_URL}/v1/messages")))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Anthropic API error {status}: {body}"));
        }

        let decoded: MessagesResponse = response.json().await?;
        let text = decoded
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(anyhow!("Anthropic returned no text content"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use docket_core::intent::ChatMessage;

    use super::coalesce;

    #[test]
    fn merges_consecutive_assistant_turns() {
        let history = vec![
            ChatMessage::user("open a case"),
            ChatMessage::assistant("{\"action\":\"create_case\"}", None),
            ChatMessage::assistant("Created case 123/2026.", None),
        ];

        let messages = coalesce(&history, "thanks");
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert!(messages[1].content.contains("create_case"));
        assert!(messages[1].content.contains("Created case 123/2026."));
    }

    #[test]
    fn drops_assistant_text_before_the_first_user_turn() {
        let history = vec![ChatMessage::assistant("stale tail from a pruned window", None)];

        let messages = coalesce(&history, "hello");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "hello");
    }
}
