use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::case::CaseId;
use crate::domain::FirmId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A filing or piece of correspondence registered by reference.
    Record,
    /// Long-form text generated in-session and stored with its body.
    Draft,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Draft => "draft",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "record" => Some(Self::Record),
            "draft" => Some(Self::Draft),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub firm_id: FirmId,
    pub case_id: Option<CaseId>,
    pub number: Option<String>,
    pub title: String,
    pub kind: DocumentKind,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(firm_id: FirmId, title: impl Into<String>, kind: DocumentKind) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId(Uuid::new_v4()),
            firm_id,
            case_id: None,
            number: None,
            title: title.into(),
            kind,
            body: None,
            created_at: now,
            updated_at: now,
        }
    }
}
