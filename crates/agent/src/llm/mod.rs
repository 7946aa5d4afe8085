use std::sync::Arc;

use anyhow::Result;

use docket_core::config::{LlmBackend, LlmConfig};
use docket_core::intent::ChatMessage;

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod scripted;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use scripted::ScriptedClient;

/// One chat completion backend. Implementations wrap a single provider API
/// and are interchangeable from the session's point of view.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Short name recorded next to every reply this backend produces.
    fn tag(&self) -> &'static str;

    /// Cheap reachability check, run once when the session picks its backend.
    async fn probe(&self) -> Result<()>;

    /// One completion over the prior transcript plus the new user message.
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_text: &str,
    ) -> Result<String>;
}

/// Builds a client per configured backend, in priority order. Backends listed
/// without the credentials they need are skipped rather than failing startup.
pub fn build_candidates(config: &LlmConfig) -> Result<Vec<Arc<dyn LlmClient>>> {
    let mut candidates: Vec<Arc<dyn LlmClient>> = Vec::new();

    for backend in &config.priority {
        match backend {
            LlmBackend::OpenAi => {
                if let Some(client) =
                    OpenAiClient::from_config(&config.openai, config.timeout_secs)?
                {
                    candidates.push(Arc::new(client));
                }
            }
            LlmBackend::Anthropic => {
                if let Some(client) =
                    AnthropicClient::from_config(&config.anthropic, config.timeout_secs)?
                {
                    candidates.push(Arc::new(client));
                }
            }
            LlmBackend::Ollama => {
                candidates
                    .push(Arc::new(OllamaClient::from_config(&config.ollama, config.timeout_secs)?));
            }
        }
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use docket_core::config::{AppConfig, LlmBackend, LlmConfig};

    use super::build_candidates;

    fn llm_config() -> LlmConfig {
        AppConfig::default().llm
    }

    #[test]
    fn skips_backends_without_credentials() {
        let mut config = llm_config();
        config.priority = vec![LlmBackend::OpenAi, LlmBackend::Anthropic, LlmBackend::Ollama];

        let candidates = build_candidates(&config).expect("build");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].tag(), "ollama");
    }

    #[test]
    fn keeps_priority_order() {
        let mut config = llm_config();
        config.priority = vec![LlmBackend::Anthropic, LlmBackend::Ollama];
        config.anthropic.api_key = Some("sk-ant-test".to_string().into());

        let candidates = build_candidates(&config).expect("build");
        let tags: Vec<_> = candidates.iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["anthropic", "ollama"]);
    }
}
