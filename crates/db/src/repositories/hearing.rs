use sqlx::Row;

use docket_core::domain::case::CaseId;
use docket_core::domain::hearing::{Hearing, HearingId};
use docket_core::domain::FirmId;

use super::{parse_timestamp, parse_uuid, HearingRepository, RepositoryError};
use crate::DbPool;

pub struct SqlHearingRepository {
    pool: DbPool,
}

impl SqlHearingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_hearing(row: &sqlx::sqlite::SqliteRow) -> Result<Hearing, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let firm_id: String =
        row.try_get("firm_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let case_id: String =
        row.try_get("case_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let scheduled_for: String =
        row.try_get("scheduled_for").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let location: Option<String> =
        row.try_get("location").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let purpose: Option<String> =
        row.try_get("purpose").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Hearing {
        id: HearingId(parse_uuid(&id, "hearing.id")?),
        firm_id: FirmId(parse_uuid(&firm_id, "hearing.firm_id")?),
        case_id: CaseId(parse_uuid(&case_id, "hearing.case_id")?),
        scheduled_for,
        location,
        purpose,
        notes,
        created_at: parse_timestamp(&created_at_str),
    })
}

#[async_trait::async_trait]
impl HearingRepository for SqlHearingRepository {
    async fn list(&self, firm: &FirmId) -> Result<Vec<Hearing>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, firm_id, case_id, scheduled_for, location, purpose, notes, created_at
             FROM hearing WHERE firm_id = ? ORDER BY scheduled_for ASC",
        )
        .bind(firm.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_hearing).collect::<Result<Vec<_>, _>>()
    }

    async fn list_for_case(
        &self,
        firm: &FirmId,
        case_id: &CaseId,
    ) -> Result<Vec<Hearing>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, firm_id, case_id, scheduled_for, location, purpose, notes, created_at
             FROM hearing WHERE firm_id = ? AND case_id = ? ORDER BY scheduled_for ASC",
        )
        .bind(firm.0.to_string())
        .bind(case_id.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_hearing).collect::<Result<Vec<_>, _>>()
    }

    async fn insert(&self, hearing: Hearing) -> Result<Hearing, RepositoryError> {
        sqlx::query(
            "INSERT INTO hearing (id, firm_id, case_id, scheduled_for, location, purpose,
                                  notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(hearing.id.0.to_string())
        .bind(hearing.firm_id.0.to_string())
        .bind(hearing.case_id.0.to_string())
        .bind(&hearing.scheduled_for)
        .bind(&hearing.location)
        .bind(&hearing.purpose)
        .bind(&hearing.notes)
        .bind(hearing.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(hearing)
    }
}
