use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::client::ClientId;
use crate::domain::FirmId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseId(pub Uuid);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Open,
    Suspended,
    Archived,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Suspended => "suspended",
            Self::Archived => "archived",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" | "active" => Some(Self::Open),
            "suspended" | "on_hold" | "on hold" => Some(Self::Suspended),
            "archived" | "closed" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub firm_id: FirmId,
    pub client_id: ClientId,
    pub number: String,
    pub title: Option<String>,
    pub court: Option<String>,
    pub status: CaseStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    pub fn new(firm_id: FirmId, client_id: ClientId, number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CaseId(Uuid::new_v4()),
            firm_id,
            client_id,
            number: number.into(),
            title: None,
            court: None,
            status: CaseStatus::Open,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_transition_to(&self, next: CaseStatus) -> bool {
        matches!(
            (&self.status, next),
            (CaseStatus::Open, CaseStatus::Suspended)
                | (CaseStatus::Open, CaseStatus::Archived)
                | (CaseStatus::Suspended, CaseStatus::Open)
                | (CaseStatus::Suspended, CaseStatus::Archived)
        )
    }

    pub fn transition_to(&mut self, next: CaseStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidCaseTransition { from: self.status, to: next })
    }
}
