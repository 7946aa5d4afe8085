use sqlx::Row;

use docket_core::domain::case::{Case, CaseId, CaseStatus};
use docket_core::domain::client::ClientId;
use docket_core::domain::FirmId;

use super::{parse_timestamp, parse_uuid, CaseRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCaseRepository {
    pool: DbPool,
}

impl SqlCaseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_case(row: &sqlx::sqlite::SqliteRow) -> Result<Case, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let firm_id: String =
        row.try_get("firm_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let client_id: String =
        row.try_get("client_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let number: String =
        row.try_get("number").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let title: Option<String> =
        row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let court: Option<String> =
        row.try_get("court").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Case {
        id: CaseId(parse_uuid(&id, "court_case.id")?),
        firm_id: FirmId(parse_uuid(&firm_id, "court_case.firm_id")?),
        client_id: ClientId(parse_uuid(&client_id, "court_case.client_id")?),
        number,
        title,
        court,
        status: CaseStatus::parse(&status_str).unwrap_or(CaseStatus::Open),
        notes,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

#[async_trait::async_trait]
impl CaseRepository for SqlCaseRepository {
    async fn find_by_id(
        &self,
        firm: &FirmId,
        id: &CaseId,
    ) -> Result<Option<Case>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, firm_id, client_id, number, title, court, status, notes,
                    created_at, updated_at
             FROM court_case WHERE firm_id = ? AND id = ?",
        )
        .bind(firm.0.to_string())
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_case(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_number(
        &self,
        firm: &FirmId,
        number: &str,
    ) -> Result<Option<Case>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, firm_id, client_id, number, title, court, status, notes,
                    created_at, updated_at
             FROM court_case WHERE firm_id = ? AND number = ?",
        )
        .bind(firm.0.to_string())
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_case(r)?)),
            None => Ok(None),
        }
    }

    async fn search(&self, firm: &FirmId, needle: &str) -> Result<Vec<Case>, RepositoryError> {
        let pattern = format!("%{needle}%");
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, firm_id, client_id, number, title, court, status, notes,
                    created_at, updated_at
             FROM court_case
             WHERE firm_id = ? AND (number LIKE ? OR title LIKE ? COLLATE NOCASE)
             ORDER BY updated_at DESC",
        )
        .bind(firm.0.to_string())
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_case).collect::<Result<Vec<_>, _>>()
    }

    async fn list(&self, firm: &FirmId) -> Result<Vec<Case>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, firm_id, client_id, number, title, court, status, notes,
                    created_at, updated_at
             FROM court_case WHERE firm_id = ? ORDER BY updated_at DESC",
        )
        .bind(firm.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_case).collect::<Result<Vec<_>, _>>()
    }

    async fn insert(&self, case: Case) -> Result<Case, RepositoryError> {
        sqlx::query(
            "INSERT INTO court_case (id, firm_id, client_id, number, title, court, status,
                                     notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(case.id.0.to_string())
        .bind(case.firm_id.0.to_string())
        .bind(case.client_id.0.to_string())
        .bind(&case.number)
        .bind(&case.title)
        .bind(&case.court)
        .bind(case.status.as_str())
        .bind(&case.notes)
        .bind(case.created_at.to_rfc3339())
        .bind(case.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(case)
    }

    async fn update(&self, case: Case) -> Result<Case, RepositoryError> {
        sqlx::query(
            "UPDATE court_case
             SET client_id = ?, number = ?, title = ?, court = ?, status = ?, notes = ?,
                 updated_at = ?
             WHERE firm_id = ? AND id = ?",
        )
        .bind(case.client_id.0.to_string())
        .bind(&case.number)
        .bind(&case.title)
        .bind(&case.court)
        .bind(case.status.as_str())
        .bind(&case.notes)
        .bind(case.updated_at.to_rfc3339())
        .bind(case.firm_id.0.to_string())
        .bind(case.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(case)
    }
}
