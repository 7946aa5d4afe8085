use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use docket_core::config::OpenAiConfig;
use docket_core::intent::ChatMessage;

use super::LlmClient;

const PUBLIC_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<RequestMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// OpenAI chat completions, or any compatible server reached through
/// `base_url` (proxies, local gateways).
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    /// Returns `None` when the backend is listed but has neither an API key
    /// nor a compatible-server url to talk to.
    pub fn from_config(config: &OpenAiConfig, timeout_secs: u64) -> Result<Option<Self>> {
        let api_key = config.api_key.as_ref().map(|key| key.expose_secret().to_string());
        if api_key.is_none() && config.base_url.is_none() {
            return Ok(None);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building openai http client")?;

        Ok(Some(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| PUBLIC_BASE_URL.to_string()),
            api_key,
            model: config.model.clone(),
        }))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {key}")),
            None => request,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn tag(&self) -> &'static str {
        "openai"
    }

    async fn probe(&self) -> Result<()> {
        let response = self.authorize(self.client.get(self.endpoint("models"))).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("OpenAI probe failed with status {}", response.status()));
        }
        Ok(())
    }

    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_text: &str,
    ) -> Result<String> {
        let mut messages =
            vec![RequestMessage { role: "system", content: system_prompt.to_string() }];
        for message in history {
            messages
                .push(RequestMessage { role: message.role.as_str(), content: message.text.clone() });
        }
        messages.push(RequestMessage { role: "user", content: user_text.to_string() });

        let request = ChatRequest { model: self.model.clone(), messages, temperature: 0.1 };
        let response = self
            .authorize(self.client.post(self.endpoint("chat/completions")))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error {status}: {body}"));
        }

        let decoded: ChatResponse = response.json().await?;
        decoded
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("OpenAI returned no choices"))
    }
}
