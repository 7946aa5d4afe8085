use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::case::CaseId;
use crate::domain::FirmId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HearingId(pub Uuid);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hearing {
    pub id: HearingId,
    pub firm_id: FirmId,
    pub case_id: CaseId,
    /// Free-form schedule text as the user gave it, e.g. "2026-09-12 09:30" or "next Monday".
    pub scheduled_for: String,
    pub location: Option<String>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Hearing {
    pub fn new(firm_id: FirmId, case_id: CaseId, scheduled_for: impl Into<String>) -> Self {
        Self {
            id: HearingId(Uuid::new_v4()),
            firm_id,
            case_id,
            scheduled_for: scheduled_for.into(),
            location: None,
            purpose: None,
            notes: None,
            created_at: Utc::now(),
        }
    }
}
