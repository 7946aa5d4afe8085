use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use docket_core::domain::case::{Case, CaseId};
use docket_core::domain::client::{Client, ClientId};
use docket_core::domain::document::{Document, DocumentId};
use docket_core::domain::event::{AgendaEvent, EventId};
use docket_core::domain::hearing::Hearing;
use docket_core::domain::FirmId;
use docket_core::intent::ChatMessage;

use super::{
    CaseRepository, ClientRepository, DocumentRepository, EventRepository, HearingRepository,
    RepositoryError, TranscriptRepository,
};

#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: RwLock<HashMap<Uuid, Client>>,
}

#[async_trait::async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn find_by_id(
        &self,
        firm: &FirmId,
        id: &ClientId,
    ) -> Result<Option<Client>, RepositoryError> {
        let clients = self.clients.read().await;
        Ok(clients.get(&id.0).filter(|c| c.firm_id == *firm).cloned())
    }

    async fn find_by_tax_id(
        &self,
        firm: &FirmId,
        tax_id: &str,
    ) -> Result<Option<Client>, RepositoryError> {
        let clients = self.clients.read().await;
        Ok(clients
            .values()
            .find(|c| c.firm_id == *firm && c.tax_id.as_deref() == Some(tax_id))
            .cloned())
    }

    async fn search(&self, firm: &FirmId, needle: &str) -> Result<Vec<Client>, RepositoryError> {
        let needle_lower = needle.to_lowercase();
        let clients = self.clients.read().await;
        let mut found: Vec<Client> = clients
            .values()
            .filter(|c| {
                c.firm_id == *firm
                    && (c.name.to_lowercase().contains(&needle_lower)
                        || c.tax_id.as_deref() == Some(needle))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn insert(&self, client: Client) -> Result<Client, RepositoryError> {
        let mut clients = self.clients.write().await;
        if let Some(tax_id) = client.tax_id.as_deref() {
            let taken = clients
                .values()
                .any(|c| c.firm_id == client.firm_id && c.tax_id.as_deref() == Some(tax_id));
            if taken {
                return Err(RepositoryError::Conflict(format!(
                    "client with tax id {tax_id} already exists (unique constraint)"
                )));
            }
        }
        clients.insert(client.id.0, client.clone());
        Ok(client)
    }

    async fn update(&self, client: Client) -> Result<Client, RepositoryError> {
        let mut clients = self.clients.write().await;
        clients.insert(client.id.0, client.clone());
        Ok(client)
    }
}

#[derive(Default)]
pub struct InMemoryCaseRepository {
    cases: RwLock<HashMap<Uuid, Case>>,
}

#[async_trait::async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn find_by_id(
        &self,
        firm: &FirmId,
        id: &CaseId,
    ) -> Result<Option<Case>, RepositoryError> {
        let cases = self.cases.read().await;
        Ok(cases.get(&id.0).filter(|c| c.firm_id == *firm).cloned())
    }

    async fn find_by_number(
        &self,
        firm: &FirmId,
        number: &str,
    ) -> Result<Option<Case>, RepositoryError> {
        let cases = self.cases.read().await;
        Ok(cases.values().find(|c| c.firm_id == *firm && c.number == number).cloned())
    }

    async fn search(&self, firm: &FirmId, needle: &str) -> Result<Vec<Case>, RepositoryError> {
        let needle_lower = needle.to_lowercase();
        let cases = self.cases.read().await;
        let mut found: Vec<Case> = cases
            .values()
            .filter(|c| {
                c.firm_id == *firm
                    && (c.number.contains(needle)
                        || c.title
                            .as_deref()
                            .is_some_and(|t| t.to_lowercase().contains(&needle_lower)))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn list(&self, firm: &FirmId) -> Result<Vec<Case>, RepositoryError> {
        let cases = self.cases.read().await;
        let mut found: Vec<Case> =
            cases.values().filter(|c| c.firm_id == *firm).cloned().collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn insert(&self, case: Case) -> Result<Case, RepositoryError> {
        let mut cases = self.cases.write().await;
        let taken =
            cases.values().any(|c| c.firm_id == case.firm_id && c.number == case.number);
        if taken {
            return Err(RepositoryError::Conflict(format!(
                "case {} already exists (unique constraint)",
                case.number
            )));
        }
        cases.insert(case.id.0, case.clone());
        Ok(case)
    }

    async fn update(&self, case: Case) -> Result<Case, RepositoryError> {
        let mut cases = self.cases.write().await;
        cases.insert(case.id.0, case.clone());
        Ok(case)
    }
}

#[derive(Default)]
pub struct InMemoryHearingRepository {
    hearings: RwLock<HashMap<Uuid, Hearing>>,
}

#[async_trait::async_trait]
impl HearingRepository for InMemoryHearingRepository {
    async fn list(&self, firm: &FirmId) -> Result<Vec<Hearing>, RepositoryError> {
        let hearings = self.hearings.read().await;
        let mut found: Vec<Hearing> =
            hearings.values().filter(|h| h.firm_id == *firm).cloned().collect();
        found.sort_by(|a, b| a.scheduled_for.cmp(&b.scheduled_for));
        Ok(found)
    }

    async fn list_for_case(
        &self,
        firm: &FirmId,
        case_id: &CaseId,
    ) -> Result<Vec<Hearing>, RepositoryError> {
        let hearings = self.hearings.read().await;
        let mut found: Vec<Hearing> = hearings
            .values()
            .filter(|h| h.firm_id == *firm && h.case_id == *case_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.scheduled_for.cmp(&b.scheduled_for));
        Ok(found)
    }

    async fn insert(&self, hearing: Hearing) -> Result<Hearing, RepositoryError> {
        let mut hearings = self.hearings.write().await;
        hearings.insert(hearing.id.0, hearing.clone());
        Ok(hearing)
    }
}

#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: RwLock<HashMap<Uuid, Document>>,
}

#[async_trait::async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn find_by_id(
        &self,
        firm: &FirmId,
        id: &DocumentId,
    ) -> Result<Option<Document>, RepositoryError> {
        let documents = self.documents.read().await;
        Ok(documents.get(&id.0).filter(|d| d.firm_id == *firm).cloned())
    }

    async fn find_by_number(
        &self,
        firm: &FirmId,
        number: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .find(|d| d.firm_id == *firm && d.number.as_deref() == Some(number))
            .cloned())
    }

    async fn search(&self, firm: &FirmId, needle: &str) -> Result<Vec<Document>, RepositoryError> {
        let needle_lower = needle.to_lowercase();
        let documents = self.documents.read().await;
        let mut found: Vec<Document> = documents
            .values()
            .filter(|d| {
                d.firm_id == *firm
                    && (d.number.as_deref().is_some_and(|n| n.contains(needle))
                        || d.title.to_lowercase().contains(&needle_lower))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn list_for_case(
        &self,
        firm: &FirmId,
        case_id: &CaseId,
    ) -> Result<Vec<Document>, RepositoryError> {
        let documents = self.documents.read().await;
        let mut found: Vec<Document> = documents
            .values()
            .filter(|d| d.firm_id == *firm && d.case_id == Some(*case_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn insert(&self, document: Document) -> Result<Document, RepositoryError> {
        let mut documents = self.documents.write().await;
        if let Some(number) = document.number.as_deref() {
            let taken = documents
                .values()
                .any(|d| d.firm_id == document.firm_id && d.number.as_deref() == Some(number));
            if taken {
                return Err(RepositoryError::Conflict(format!(
                    "document {number} already exists (unique constraint)"
                )));
            }
        }
        documents.insert(document.id.0, document.clone());
        Ok(document)
    }

    async fn update(&self, document: Document) -> Result<Document, RepositoryError> {
        let mut documents = self.documents.write().await;
        documents.insert(document.id.0, document.clone());
        Ok(document)
    }
}

#[derive(Default)]
pub struct InMemoryEventRepository {
    events: RwLock<HashMap<Uuid, AgendaEvent>>,
}

#[async_trait::async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn list(&self, firm: &FirmId) -> Result<Vec<AgendaEvent>, RepositoryError> {
        let events = self.events.read().await;
        let mut found: Vec<AgendaEvent> =
            events.values().filter(|e| e.firm_id == *firm).cloned().collect();
        found.sort_by(|a, b| a.event_date.cmp(&b.event_date));
        Ok(found)
    }

    async fn insert(&self, event: AgendaEvent) -> Result<AgendaEvent, RepositoryError> {
        let mut events = self.events.write().await;
        events.insert(event.id.0, event.clone());
        Ok(event)
    }

    async fn delete(&self, firm: &FirmId, id: &EventId) -> Result<bool, RepositoryError> {
        let mut events = self.events.write().await;
        if events.get(&id.0).is_some_and(|e| e.firm_id == *firm) {
            events.remove(&id.0);
            return Ok(true);
        }
        Ok(false)
    }
}

#[derive(Default)]
pub struct InMemoryTranscriptRepository {
    messages: RwLock<Vec<(FirmId, ChatMessage)>>,
}

#[async_trait::async_trait]
impl TranscriptRepository for InMemoryTranscriptRepository {
    async fn recent(
        &self,
        firm: &FirmId,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.read().await;
        let for_firm: Vec<ChatMessage> =
            messages.iter().filter(|(f, _)| f == firm).map(|(_, m)| m.clone()).collect();
        let skip = for_firm.len().saturating_sub(limit as usize);
        Ok(for_firm.into_iter().skip(skip).collect())
    }

    async fn append(&self, firm: &FirmId, message: &ChatMessage) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        messages.push((*firm, message.clone()));
        Ok(())
    }

    async fn prune(&self, firm: &FirmId, keep: u32) -> Result<u64, RepositoryError> {
        let mut messages = self.messages.write().await;
        let count = messages.iter().filter(|(f, _)| f == firm).count();
        let excess = count.saturating_sub(keep as usize);
        if excess == 0 {
            return Ok(0);
        }

        // Entries are in append order, so the oldest for this firm go first.
        let mut to_drop = excess;
        messages.retain(|(f, _)| {
            if f == firm && to_drop > 0 {
                to_drop -= 1;
                return false;
            }
            true
        });
        Ok(excess as u64)
    }

    async fn clear(&self, firm: &FirmId) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        messages.retain(|(f, _)| f != firm);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use docket_core::domain::case::Case;
    use docket_core::domain::client::{Client, ClientId};
    use docket_core::domain::event::AgendaEvent;
    use docket_core::domain::FirmId;
    use docket_core::intent::ChatMessage;

    use crate::repositories::{
        CaseRepository, ClientRepository, EventRepository, InMemoryCaseRepository,
        InMemoryClientRepository, InMemoryEventRepository, InMemoryTranscriptRepository,
        TranscriptRepository,
    };

    #[tokio::test]
    async fn in_memory_client_repo_round_trip_and_search() {
        let repo = InMemoryClientRepository::default();
        let firm = FirmId(Uuid::new_v4());

        let mut client = Client::new(firm, "Ana Souza");
        client.tax_id = Some("12-34567890-1".to_string());
        repo.insert(client.clone()).await.expect("insert");

        let found = repo.find_by_id(&firm, &client.id).await.expect("find");
        assert_eq!(found, Some(client.clone()));

        let by_name = repo.search(&firm, "ana").await.expect("search");
        assert_eq!(by_name.len(), 1);

        let by_tax = repo.find_by_tax_id(&firm, "12-34567890-1").await.expect("find by tax");
        assert_eq!(by_tax.map(|c| c.id), Some(client.id));
    }

    #[tokio::test]
    async fn in_memory_case_repo_rejects_duplicate_numbers() {
        let repo = InMemoryCaseRepository::default();
        let firm = FirmId(Uuid::new_v4());
        let client_id = ClientId(Uuid::new_v4());

        repo.insert(Case::new(firm, client_id, "123/2026")).await.expect("insert");
        let error = repo
            .insert(Case::new(firm, client_id, "123/2026"))
            .await
            .expect_err("duplicate should fail");
        assert!(error.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn in_memory_transcript_keeps_newest_on_prune() {
        let repo = InMemoryTranscriptRepository::default();
        let firm = FirmId(Uuid::new_v4());

        for i in 0..5 {
            repo.append(&firm, &ChatMessage::user(format!("m{i}"))).await.expect("append");
        }

        let removed = repo.prune(&firm, 2).await.expect("prune");
        assert_eq!(removed, 3);

        let rest = repo.recent(&firm, 10).await.expect("recent");
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].text, "m3");
        assert_eq!(rest[1].text, "m4");
    }

    #[tokio::test]
    async fn in_memory_event_delete_is_firm_scoped() {
        let repo = InMemoryEventRepository::default();
        let firm_a = FirmId(Uuid::new_v4());
        let firm_b = FirmId(Uuid::new_v4());

        let event = AgendaEvent::new(firm_a, "Filing deadline", "2026-09-01");
        let id = event.id;
        repo.insert(event).await.expect("insert");

        assert!(!repo.delete(&firm_b, &id).await.expect("delete wrong firm"));
        assert!(repo.delete(&firm_a, &id).await.expect("delete"));
    }
}
