use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use docket_core::config::OllamaConfig;
use docket_core::intent::{ChatMessage, ChatRole};

use super::LlmClient;

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    system: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Local Ollama daemon. Always constructed when listed, since it needs no
/// credentials; the probe decides whether it is actually running.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn from_config(config: &OllamaConfig, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building ollama http client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

/// The generate endpoint takes one flat prompt, so the transcript is rendered
/// as labelled turns with the reply cue left open.
fn flatten(history: &[ChatMessage], user_text: &str) -> String {
    let mut prompt = String::new();
    for message in history {
        let label = match message.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        };
        prompt.push_str(label);
        prompt.push_str(": ");
        prompt.push_str(&message.text);
        prompt.push('\n');
    }
    prompt.push_str("User: ");
    prompt.push_str(user_text);
    prompt.push_str("\nAssistant:");
    prompt
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn tag(&self) -> &'static str {
        "ollama"
    }

    async fn probe(&self) -> Result<()> {
        let response = self.client.get(format!("{}/api/tags", self.base_url)).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Ollama probe failed with status {}", response.status()));
        }
        Ok(())
    }

    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_text: &str,
    ) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: flatten(history, user_text),
            system: system_prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Ollama API error {status}: {body}"));
        }

        let decoded: GenerateResponse = response.json().await?;
        Ok(decoded.response)
    }
}

#[cfg(test)]
mod tests {
    use docket_core::intent::ChatMessage;

    use super::flatten;

    #[test]
    fn renders_turns_with_labels_and_an_open_cue() {
        let history = vec![
            ChatMessage::user("list my cases"),
            ChatMessage::assistant("You have 2 open cases.", None),
        ];

        let prompt = flatten(&history, "and hearings?");
        assert_eq!(
            prompt,
            "User: list my cases\nAssistant: You have 2 open cases.\nUser: and hearings?\nAssistant:"
        );
    }
}
