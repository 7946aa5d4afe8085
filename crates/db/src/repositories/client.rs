use sqlx::Row;

use docket_core::domain::client::{Client, ClientId};
use docket_core::domain::FirmId;

use super::{parse_timestamp, parse_uuid, ClientRepository, RepositoryError};
use crate::DbPool;

pub struct SqlClientRepository {
    pool: DbPool,
}

impl SqlClientRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_client(row: &sqlx::sqlite::SqliteRow) -> Result<Client, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let firm_id: String =
        row.try_get("firm_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tax_id: Option<String> =
        row.try_get("tax_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: Option<String> =
        row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let phone: Option<String> =
        row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Client {
        id: ClientId(parse_uuid(&id, "client.id")?),
        firm_id: FirmId(parse_uuid(&firm_id, "client.firm_id")?),
        name,
        tax_id,
        email,
        phone,
        notes,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

#[async_trait::async_trait]
impl ClientRepository for SqlClientRepository {
    async fn find_by_id(
        &self,
        firm: &FirmId,
        id: &ClientId,
    ) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, firm_id, name, tax_id, email, phone, notes, created_at, updated_at
             FROM client WHERE firm_id = ? AND id = ?",
        )
        .bind(firm.0.to_string())
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_client(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_tax_id(
        &self,
        firm: &FirmId,
        tax_id: &str,
    ) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, firm_id, name, tax_id, email, phone, notes, created_at, updated_at
             FROM client WHERE firm_id = ? AND tax_id = ?",
        )
        .bind(firm.0.to_string())
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_client(r)?)),
            None => Ok(None),
        }
    }

    async fn search(&self, firm: &FirmId, needle: &str) -> Result<Vec<Client>, RepositoryError> {
        let pattern = format!("%{needle}%");
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, firm_id, name, tax_id, email, phone, notes, created_at, updated_at
             FROM client
             WHERE firm_id = ? AND (name LIKE ? COLLATE NOCASE OR tax_id = ?)
             ORDER BY name ASC",
        )
        .bind(firm.0.to_string())
        .bind(&pattern)
        .bind(needle)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_client).collect::<Result<Vec<_>, _>>()
    }

    async fn insert(&self, client: Client) -> Result<Client, RepositoryError> {
        sqlx::query(
            "INSERT INTO client (id, firm_id, name, tax_id, email, phone, notes,
                                 created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(client.id.0.to_string())
        .bind(client.firm_id.0.to_string())
        .bind(&client.name)
        .bind(&client.tax_id)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.notes)
        .bind(client.created_at.to_rfc3339())
        .bind(client.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(client)
    }

    async fn update(&self, client: Client) -> Result<Client, RepositoryError> {
        sqlx::query(
            "UPDATE client
             SET name = ?, tax_id = ?, email = ?, phone = ?, notes = ?, updated_at = ?
             WHERE firm_id = ? AND id = ?",
        )
        .bind(&client.name)
        .bind(&client.tax_id)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.notes)
        .bind(client.updated_at.to_rfc3339())
        .bind(client.firm_id.0.to_string())
        .bind(client.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(client)
    }
}
