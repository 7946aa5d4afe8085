use std::sync::Arc;

use docket_core::domain::FirmId;
use docket_core::intent::ChatMessage;
use docket_db::repositories::{RepositoryError, TranscriptRepository};

/// Rolling dialogue window backed by the transcript store. Appends write
/// through, and the cached window never grows past [`MemoryLog::CAP`]; older
/// rows are pruned from the store at the same time.
pub struct MemoryLog {
    firm: FirmId,
    store: Arc<dyn TranscriptRepository>,
    messages: Vec<ChatMessage>,
}

impl MemoryLog {
    pub const CAP: usize = 50;

    /// Loads the newest window for the firm, oldest first.
    pub async fn open(
        firm: FirmId,
        store: Arc<dyn TranscriptRepository>,
    ) -> Result<Self, RepositoryError> {
        let messages = store.recent(&firm, Self::CAP as u32).await?;
        Ok(Self { firm, store, messages })
    }

    pub async fn append(&mut self, message: ChatMessage) -> Result<(), RepositoryError> {
        self.store.append(&self.firm, &message).await?;
        self.messages.push(message);

        if self.messages.len() > Self::CAP {
            let excess = self.messages.len() - Self::CAP;
            self.messages.drain(..excess);
            self.store.prune(&self.firm, Self::CAP as u32).await?;
        }
        Ok(())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub async fn clear(&mut self) -> Result<(), RepositoryError> {
        self.store.clear(&self.firm).await?;
        self.messages.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use docket_core::domain::FirmId;
    use docket_core::intent::ChatMessage;
    use docket_db::repositories::{InMemoryTranscriptRepository, TranscriptRepository};

    use super::MemoryLog;

    #[tokio::test]
    async fn window_stays_at_the_cap_and_keeps_the_newest() {
        let store = Arc::new(InMemoryTranscriptRepository::default());
        let firm = FirmId(Uuid::new_v4());
        let mut log = MemoryLog::open(firm, store.clone()).await.expect("open");

        for i in 0..(MemoryLog::CAP + 10) {
            log.append(ChatMessage::user(format!("m{i}"))).await.expect("append");
        }

        assert_eq!(log.messages().len(), MemoryLog::CAP);
        assert_eq!(log.messages()[0].text, "m10");

        let stored = store.recent(&firm, 200).await.expect("recent");
        assert_eq!(stored.len(), MemoryLog::CAP);
        assert_eq!(stored[0].text, "m10");
    }

    #[tokio::test]
    async fn open_resumes_an_existing_conversation() {
        let store = Arc::new(InMemoryTranscriptRepository::default());
        let firm = FirmId(Uuid::new_v4());
        store.append(&firm, &ChatMessage::user("earlier question")).await.expect("append");
        store
            .append(&firm, &ChatMessage::assistant("earlier answer", Some("ollama".to_string())))
            .await
            .expect("append");

        let log = MemoryLog::open(firm, store).await.expect("open");
        assert_eq!(log.messages().len(), 2);
        assert_eq!(log.messages()[1].text, "earlier answer");
    }

    #[tokio::test]
    async fn clear_empties_window_and_store() {
        let store = Arc::new(InMemoryTranscriptRepository::default());
        let firm = FirmId(Uuid::new_v4());
        let mut log = MemoryLog::open(firm, store.clone()).await.expect("open");
        log.append(ChatMessage::user("hello")).await.expect("append");

        log.clear().await.expect("clear");

        assert!(log.messages().is_empty());
        assert!(store.recent(&firm, 10).await.expect("recent").is_empty());
    }
}
