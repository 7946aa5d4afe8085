use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::FirmId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub firm_id: FirmId,
    pub name: String,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn new(firm_id: FirmId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ClientId(Uuid::new_v4()),
            firm_id,
            name: name.into(),
            tax_id: None,
            email: None,
            phone: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}
