use sqlx::Row;

use docket_core::domain::case::CaseId;
use docket_core::domain::document::{Document, DocumentId, DocumentKind};
use docket_core::domain::FirmId;

use super::{parse_timestamp, parse_uuid, DocumentRepository, RepositoryError};
use crate::DbPool;

pub struct SqlDocumentRepository {
    pool: DbPool,
}

impl SqlDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<Document, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let firm_id: String =
        row.try_get("firm_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let case_id: Option<String> =
        row.try_get("case_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let number: Option<String> =
        row.try_get("number").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let title: String = row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let kind_str: String =
        row.try_get("kind").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let body: Option<String> =
        row.try_get("body").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let case_id = match case_id {
        Some(raw) => Some(CaseId(parse_uuid(&raw, "document.case_id")?)),
        None => None,
    };

    Ok(Document {
        id: DocumentId(parse_uuid(&id, "document.id")?),
        firm_id: FirmId(parse_uuid(&firm_id, "document.firm_id")?),
        case_id,
        number,
        title,
        kind: DocumentKind::parse(&kind_str).unwrap_or(DocumentKind::Record),
        body,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

#[async_trait::async_trait]
impl DocumentRepository for SqlDocumentRepository {
    async fn find_by_id(
        &self,
        firm: &FirmId,
        id: &DocumentId,
    ) -> Result<Option<Document>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, firm_id, case_id, number, title, kind, body, created_at, updated_at
             FROM document WHERE firm_id = ? AND id = ?",
        )
        .bind(firm.0.to_string())
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_document(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_number(
        &self,
        firm: &FirmId,
        number: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, firm_id, case_id, number, title, kind, body, created_at, updated_at
             FROM document WHERE firm_id = ? AND number = ?",
        )
        .bind(firm.0.to_string())
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_document(r)?)),
            None => Ok(None),
        }
    }

    async fn search(&self, firm: &FirmId, needle: &str) -> Result<Vec<Document>, RepositoryError> {
        let pattern = format!("%{needle}%");
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, firm_id, case_id, number, title, kind, body, created_at, updated_at
             FROM document
             WHERE firm_id = ? AND (number LIKE ? OR title LIKE ? COLLATE NOCASE)
             ORDER BY updated_at DESC",
        )
        .bind(firm.0.to_string())
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_document).collect::<Result<Vec<_>, _>>()
    }

    async fn list_for_case(
        &self,
        firm: &FirmId,
        case_id: &CaseId,
    ) -> Result<Vec<Document>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, firm_id, case_id, number, title, kind, body, created_at, updated_at
             FROM document WHERE firm_id = ? AND case_id = ?
             ORDER BY updated_at DESC",
        )
        .bind(firm.0.to_string())
        .bind(case_id.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_document).collect::<Result<Vec<_>, _>>()
    }

    async fn insert(&self, document: Document) -> Result<Document, RepositoryError> {
        sqlx::query(
            "INSERT INTO document (id, firm_id, case_id, number, title, kind, body,
                                   created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(document.id.0.to_string())
        .bind(document.firm_id.0.to_string())
        .bind(document.case_id.map(|id| id.0.to_string()))
        .bind(&document.number)
        .bind(&document.title)
        .bind(document.kind.as_str())
        .bind(&document.body)
        .bind(document.created_at.to_rfc3339())
        .bind(document.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(document)
    }

    async fn update(&self, document: Document) -> Result<Document, RepositoryError> {
        sqlx::query(
            "UPDATE document
             SET case_id = ?, number = ?, title = ?, kind = ?, body = ?, updated_at = ?
             WHERE firm_id = ? AND id = ?",
        )
        .bind(document.case_id.map(|id| id.0.to_string()))
        .bind(&document.number)
        .bind(&document.title)
        .bind(document.kind.as_str())
        .bind(&document.body)
        .bind(document.updated_at.to_rfc3339())
        .bind(document.firm_id.0.to_string())
        .bind(document.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(document)
    }
}
