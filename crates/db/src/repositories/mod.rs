use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use docket_core::domain::case::{Case, CaseId};
use docket_core::domain::client::{Client, ClientId};
use docket_core::domain::document::{Document, DocumentId};
use docket_core::domain::event::{AgendaEvent, EventId};
use docket_core::domain::hearing::Hearing;
use docket_core::domain::FirmId;
use docket_core::intent::ChatMessage;

pub mod case;
pub mod client;
pub mod document;
pub mod event;
pub mod hearing;
pub mod memory;
pub mod transcript;

pub use case::SqlCaseRepository;
pub use client::SqlClientRepository;
pub use document::SqlDocumentRepository;
pub use event::SqlEventRepository;
pub use hearing::SqlHearingRepository;
pub use memory::{
    InMemoryCaseRepository, InMemoryClientRepository, InMemoryDocumentRepository,
    InMemoryEventRepository, InMemoryHearingRepository, InMemoryTranscriptRepository,
};
pub use transcript::SqlTranscriptRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    /// A uniqueness rule was violated. SQLite reports these through
    /// [`RepositoryError::Database`]; the in-memory stores raise this directly.
    #[error("conflict: {0}")]
    Conflict(String),
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_by_id(
        &self,
        firm: &FirmId,
        id: &ClientId,
    ) -> Result<Option<Client>, RepositoryError>;

    async fn find_by_tax_id(
        &self,
        firm: &FirmId,
        tax_id: &str,
    ) -> Result<Option<Client>, RepositoryError>;

    /// Case-insensitive name substring match, plus exact tax id match.
    async fn search(&self, firm: &FirmId, needle: &str) -> Result<Vec<Client>, RepositoryError>;

    async fn insert(&self, client: Client) -> Result<Client, RepositoryError>;
    async fn update(&self, client: Client) -> Result<Client, RepositoryError>;
}

#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn find_by_id(&self, firm: &FirmId, id: &CaseId)
        -> Result<Option<Case>, RepositoryError>;

    async fn find_by_number(
        &self,
        firm: &FirmId,
        number: &str,
    ) -> Result<Option<Case>, RepositoryError>;

    /// Substring match over case number and title.
    async fn search(&self, firm: &FirmId, needle: &str) -> Result<Vec<Case>, RepositoryError>;

    async fn list(&self, firm: &FirmId) -> Result<Vec<Case>, RepositoryError>;
    async fn insert(&self, case: Case) -> Result<Case, RepositoryError>;
    async fn update(&self, case: Case) -> Result<Case, RepositoryError>;
}

#[async_trait]
pub trait HearingRepository: Send + Sync {
    async fn list(&self, firm: &FirmId) -> Result<Vec<Hearing>, RepositoryError>;

    async fn list_for_case(
        &self,
        firm: &FirmId,
        case_id: &CaseId,
    ) -> Result<Vec<Hearing>, RepositoryError>;

    async fn insert(&self, hearing: Hearing) -> Result<Hearing, RepositoryError>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn find_by_id(
        &self,
        firm: &FirmId,
        id: &DocumentId,
    ) -> Result<Option<Document>, RepositoryError>;

    async fn find_by_number(
        &self,
        firm: &FirmId,
        number: &str,
    ) -> Result<Option<Document>, RepositoryError>;

    /// Substring match over document number and title.
    async fn search(&self, firm: &FirmId, needle: &str) -> Result<Vec<Document>, RepositoryError>;

    async fn list_for_case(
        &self,
        firm: &FirmId,
        case_id: &CaseId,
    ) -> Result<Vec<Document>, RepositoryError>;

    async fn insert(&self, document: Document) -> Result<Document, RepositoryError>;
    async fn update(&self, document: Document) -> Result<Document, RepositoryError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn list(&self, firm: &FirmId) -> Result<Vec<AgendaEvent>, RepositoryError>;
    async fn insert(&self, event: AgendaEvent) -> Result<AgendaEvent, RepositoryError>;
    async fn delete(&self, firm: &FirmId, id: &EventId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait TranscriptRepository: Send + Sync {
    /// The newest `limit` messages, returned oldest first.
    async fn recent(&self, firm: &FirmId, limit: u32)
        -> Result<Vec<ChatMessage>, RepositoryError>;

    async fn append(&self, firm: &FirmId, message: &ChatMessage) -> Result<(), RepositoryError>;

    /// Drops everything but the newest `keep` messages. Returns how many rows
    /// were removed.
    async fn prune(&self, firm: &FirmId, keep: u32) -> Result<u64, RepositoryError>;

    async fn clear(&self, firm: &FirmId) -> Result<(), RepositoryError>;
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(value).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

/// Stored timestamps are RFC 3339 text. Rows written by hand or by older
/// builds may carry something else, so fall back to "now" instead of failing
/// the whole read.
pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
