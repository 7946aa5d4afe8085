use sqlx::Row;

use docket_core::domain::FirmId;
use docket_core::intent::{ChatMessage, ChatRole};

use super::{parse_timestamp, parse_uuid, RepositoryError, TranscriptRepository};
use crate::DbPool;

pub struct SqlTranscriptRepository {
    pool: DbPool,
}

impl SqlTranscriptRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<ChatMessage, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let role_str: String =
        row.try_get("role").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let body: String = row.try_get("body").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let provider_tag: Option<String> =
        row.try_get("provider_tag").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ChatMessage {
        id: parse_uuid(&id, "transcript_message.id")?,
        role: ChatRole::parse(&role_str).unwrap_or(ChatRole::User),
        text: body,
        timestamp: parse_timestamp(&created_at_str),
        provider_tag,
    })
}

#[async_trait::async_trait]
impl TranscriptRepository for SqlTranscriptRepository {
    async fn recent(
        &self,
        firm: &FirmId,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        // Newest `limit` rows, then flipped back into chronological order.
        // rowid breaks ties between messages written in the same instant.
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, role, body, provider_tag, created_at FROM (
                 SELECT rowid AS seq, id, role, body, provider_tag, created_at
                 FROM transcript_message
                 WHERE firm_id = ?
                 ORDER BY created_at DESC, seq DESC
                 LIMIT ?
             ) ORDER BY created_at ASC, seq ASC",
        )
        .bind(firm.0.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect::<Result<Vec<_>, _>>()
    }

    async fn append(&self, firm: &FirmId, message: &ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO transcript_message (id, firm_id, role, body, provider_tag, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(firm.0.to_string())
        .bind(message.role.as_str())
        .bind(&message.text)
        .bind(&message.provider_tag)
        .bind(message.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn prune(&self, firm: &FirmId, keep: u32) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM transcript_message
             WHERE firm_id = ? AND id NOT IN (
                 SELECT id FROM transcript_message
                 WHERE firm_id = ?
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?
             )",
        )
        .bind(firm.0.to_string())
        .bind(firm.0.to_string())
        .bind(keep)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn clear(&self, firm: &FirmId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM transcript_message WHERE firm_id = ?")
            .bind(firm.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use docket_core::domain::FirmId;
    use docket_core::intent::ChatMessage;

    use super::SqlTranscriptRepository;
    use crate::repositories::TranscriptRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn message_at(text: &str, minute: u32) -> ChatMessage {
        let mut message = ChatMessage::user(text);
        message.timestamp = Utc.with_ymd_and_hms(2026, 8, 1, 9, minute, 0).unwrap();
        message
    }

    #[tokio::test]
    async fn recent_returns_the_newest_messages_oldest_first() {
        let pool = setup().await;
        let repo = SqlTranscriptRepository::new(pool);
        let firm = FirmId(Uuid::new_v4());

        for (minute, text) in [(0, "first"), (1, "second"), (2, "third")] {
            repo.append(&firm, &message_at(text, minute)).await.expect("append");
        }

        let recent = repo.recent(&firm, 2).await.expect("recent");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "second");
        assert_eq!(recent[1].text, "third");
    }

    #[tokio::test]
    async fn prune_drops_everything_but_the_newest() {
        let pool = setup().await;
        let repo = SqlTranscriptRepository::new(pool);
        let firm = FirmId(Uuid::new_v4());

        for minute in 0..5 {
            repo.append(&firm, &message_at(&format!("m{minute}"), minute))
                .await
                .expect("append");
        }

        let removed = repo.prune(&firm, 3).await.expect("prune");
        assert_eq!(removed, 2);

        let rest = repo.recent(&firm, 10).await.expect("recent");
        assert_eq!(rest.len(), 3);
        assert_eq!(rest[0].text, "m2");
        assert_eq!(rest[2].text, "m4");
    }

    #[tokio::test]
    async fn clear_only_touches_the_given_firm() {
        let pool = setup().await;
        let repo = SqlTranscriptRepository::new(pool);
        let firm_a = FirmId(Uuid::new_v4());
        let firm_b = FirmId(Uuid::new_v4());

        repo.append(&firm_a, &message_at("a", 0)).await.expect("append a");
        repo.append(&firm_b, &message_at("b", 0)).await.expect("append b");

        repo.clear(&firm_a).await.expect("clear");

        assert!(repo.recent(&firm_a, 10).await.expect("recent a").is_empty());
        assert_eq!(repo.recent(&firm_b, 10).await.expect("recent b").len(), 1);
    }
}
