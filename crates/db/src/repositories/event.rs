use sqlx::Row;

use docket_core::domain::event::{AgendaEvent, EventId};
use docket_core::domain::FirmId;

use super::{parse_timestamp, parse_uuid, EventRepository, RepositoryError};
use crate::DbPool;

pub struct SqlEventRepository {
    pool: DbPool,
}

impl SqlEventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<AgendaEvent, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let firm_id: String =
        row.try_get("firm_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let title: String = row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let event_date: String =
        row.try_get("event_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(AgendaEvent {
        id: EventId(parse_uuid(&id, "agenda_event.id")?),
        firm_id: FirmId(parse_uuid(&firm_id, "agenda_event.firm_id")?),
        title,
        event_date,
        notes,
        created_at: parse_timestamp(&created_at_str),
    })
}

#[async_trait::async_trait]
impl EventRepository for SqlEventRepository {
    async fn list(&self, firm: &FirmId) -> Result<Vec<AgendaEvent>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, firm_id, title, event_date, notes, created_at
             FROM agenda_event WHERE firm_id = ? ORDER BY event_date ASC",
        )
        .bind(firm.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect::<Result<Vec<_>, _>>()
    }

    async fn insert(&self, event: AgendaEvent) -> Result<AgendaEvent, RepositoryError> {
        sqlx::query(
            "INSERT INTO agenda_event (id, firm_id, title, event_date, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(event.id.0.to_string())
        .bind(event.firm_id.0.to_string())
        .bind(&event.title)
        .bind(&event.event_date)
        .bind(&event.notes)
        .bind(event.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    async fn delete(&self, firm: &FirmId, id: &EventId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM agenda_event WHERE firm_id = ? AND id = ?")
            .bind(firm.0.to_string())
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
