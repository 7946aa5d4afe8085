use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use docket_core::intent::ChatMessage;

use crate::llm::LlmClient;

/// Front door to the language model. Probes the configured backends once, in
/// priority order, and pins the session to the first one that answers.
pub struct ProviderGateway {
    client: Arc<dyn LlmClient>,
}

impl std::fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderGateway").field("provider", &self.client.tag()).finish()
    }
}

impl ProviderGateway {
    pub async fn select(candidates: Vec<Arc<dyn LlmClient>>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(anyhow!("no llm backend is configured; check llm.priority"));
        }

        for candidate in candidates {
            match candidate.probe().await {
                Ok(()) => {
                    info!(provider = candidate.tag(), "gateway.provider_selected");
                    return Ok(Self { client: candidate });
                }
                Err(error) => {
                    warn!(provider = candidate.tag(), %error, "gateway.provider_unreachable");
                }
            }
        }

        Err(anyhow!("no configured llm backend answered its probe"))
    }

    /// Wraps an already-chosen client. Used by tests and the offline demo.
    pub fn with_client(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn provider_tag(&self) -> &'static str {
        self.client.tag()
    }

    /// Shared handle for handlers that generate text themselves.
    pub fn client(&self) -> Arc<dyn LlmClient> {
        Arc::clone(&self.client)
    }

    pub async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_text: &str,
    ) -> Result<String> {
        self.client.complete(system_prompt, history, user_text).await
    }
}
