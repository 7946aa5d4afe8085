use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use docket_core::domain::FirmId;
use docket_core::errors::DomainError;
use docket_core::intent::{ActionReport, Intent};
use docket_core::normalize::normalize_params;
use docket_db::repositories::{
    CaseRepository, ClientRepository, DocumentRepository, EventRepository, HearingRepository,
    RepositoryError,
};

use crate::llm::LlmClient;

pub mod cases;
pub mod clients;
pub mod documents;
pub mod events;
pub mod hearings;

/// Everything a handler may touch: the firm scope, the repositories, and the
/// session's provider for the handlers that generate text.
pub struct ActionContext {
    pub firm: FirmId,
    pub clients: Arc<dyn ClientRepository>,
    pub cases: Arc<dyn CaseRepository>,
    pub hearings: Arc<dyn HearingRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub events: Arc<dyn EventRepository>,
    pub llm: Arc<dyn LlmClient>,
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("missing required parameter `{0}`")]
    MissingParam(&'static str),
    #[error("invalid value for `{field}`: `{value}`")]
    InvalidParam { field: &'static str, value: String },
    #[error("{entity} {needle} was not found")]
    NotFound { entity: &'static str, needle: String },
    #[error("{entity} `{needle}` is ambiguous: {count} records match")]
    Ambiguous { entity: &'static str, needle: String, count: usize },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("provider error: {0}")]
    Provider(String),
}

/// One named operation the model may request. Handlers are stateless; every
/// call gets the full context and the (normalized) intent.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &ActionContext, intent: &Intent)
        -> Result<ActionReport, ActionError>;
}

/// Closed dispatch table. Anything the model names that is not registered
/// here fails before touching the record store.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<&'static str, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn register<H>(&mut self, handler: H)
    where
        H: ActionHandler + 'static,
    {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs one intent. Param aliases are reconciled first, and any handler
    /// error is folded into a failed report so the caller can diagnose it.
    pub async fn execute(&self, ctx: &ActionContext, intent: &Intent) -> ActionReport {
        let mut normalized = intent.clone();
        normalized.params = normalize_params(&intent.params);

        match self.handlers.get(normalized.action.as_str()) {
            Some(handler) => match handler.execute(ctx, &normalized).await {
                Ok(report) => report,
                Err(error) => ActionReport::failed(error.to_string()),
            },
            None => {
                ActionReport::failed(ActionError::UnknownAction(normalized.action.clone()).to_string())
            }
        }
    }
}

/// The full action surface, one handler per catalog entry.
pub fn default_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::default();

    registry.register(clients::SearchClients);
    registry.register(clients::CreateClient);
    registry.register(clients::UpdateClient);

    registry.register(cases::SearchCases);
    registry.register(cases::ListCases);
    registry.register(cases::CaseSummary);
    registry.register(cases::CreateCase);
    registry.register(cases::UpdateCase);

    registry.register(hearings::ListHearings);
    registry.register(hearings::CreateHearing);

    registry.register(documents::SearchDocuments);
    registry.register(documents::RegisterDocument);
    registry.register(documents::DraftDocument);

    registry.register(events::ListEvents);
    registry.register(events::CreateEvent);
    registry.register(events::DeleteEvent);

    registry
}

/// First non-empty value among `keys`, trimmed.
pub(crate) fn first_param<'a>(intent: &'a Intent, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| intent.param(key))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub(crate) fn require<'a>(intent: &'a Intent, key: &'static str) -> Result<&'a str, ActionError> {
    intent
        .param(key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ActionError::MissingParam(key))
}

pub(crate) fn optional(intent: &Intent, key: &str) -> Option<String> {
    intent
        .param(key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use uuid::Uuid;

    use docket_core::domain::FirmId;
    use docket_db::repositories::{
        InMemoryCaseRepository, InMemoryClientRepository, InMemoryDocumentRepository,
        InMemoryEventRepository, InMemoryHearingRepository,
    };

    use crate::llm::ScriptedClient;

    use super::ActionContext;

    pub(crate) fn context() -> ActionContext {
        context_with_llm(ScriptedClient::new(Vec::<String>::new()))
    }

    pub(crate) fn context_with_llm(llm: ScriptedClient) -> ActionContext {
        ActionContext {
            firm: FirmId(Uuid::new_v4()),
            clients: Arc::new(InMemoryClientRepository::default()),
            cases: Arc::new(InMemoryCaseRepository::default()),
            hearings: Arc::new(InMemoryHearingRepository::default()),
            documents: Arc::new(InMemoryDocumentRepository::default()),
            events: Arc::new(InMemoryEventRepository::default()),
            llm: Arc::new(llm),
        }
    }
}

#[cfg(test)]
mod tests {
    use docket_core::intent::Intent;

    use super::{default_registry, first_param, require};

    #[test]
    fn default_registry_covers_the_whole_catalog() {
        let registry = default_registry();
        assert_eq!(registry.len(), 16);
        assert!(registry.contains("create_client"));
        assert!(registry.contains("get_case_summary"));
        assert!(!registry.contains("drop_everything"));
    }

    #[test]
    fn require_rejects_blank_values() {
        let intent = Intent::new("create_event").with_param("title", "   ");
        assert!(require(&intent, "title").is_err());
    }

    #[test]
    fn first_param_walks_the_alias_list() {
        let intent = Intent::new("create_hearing").with_param("case_no", "123/2026");
        assert_eq!(first_param(&intent, &["case_number", "case_no"]), Some("123/2026"));
    }
}
