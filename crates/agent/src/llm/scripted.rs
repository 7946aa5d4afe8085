use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use docket_core::intent::ChatMessage;

use super::LlmClient;

/// Deterministic stand-in for a real backend: each completion pops the next
/// canned reply. Used by the session tests and the offline demo mode.
pub struct ScriptedClient {
    tag: &'static str,
    probe_ok: bool,
    failure: Option<String>,
    script: Mutex<VecDeque<String>>,
}

impl ScriptedClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag: "scripted",
            probe_ok: true,
            failure: None,
            script: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }

    /// A backend whose probe never succeeds, for fallback tests.
    pub fn unreachable() -> Self {
        Self {
            tag: "unreachable",
            probe_ok: false,
            failure: None,
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// A reachable backend whose completions always fail with `message`.
    pub fn erroring(message: impl Into<String>) -> Self {
        Self {
            tag: "scripted",
            probe_ok: true,
            failure: Some(message.into()),
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn tag(&self) -> &'static str {
        self.tag
    }

    async fn probe(&self) -> Result<()> {
        if self.probe_ok {
            Ok(())
        } else {
            Err(anyhow!("{} did not answer its probe", self.tag))
        }
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _history: &[ChatMessage],
        _user_text: &str,
    ) -> Result<String> {
        if let Some(message) = &self.failure {
            return Err(anyhow!("{message}"));
        }

        let mut script =
            self.script.lock().map_err(|_| anyhow!("scripted reply queue poisoned"))?;
        script.pop_front().ok_or_else(|| anyhow!("scripted client ran out of replies"))
    }
}
