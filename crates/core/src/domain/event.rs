use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::FirmId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

/// Agenda entry outside any case: deadlines, reminders, office matters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaEvent {
    pub id: EventId,
    pub firm_id: FirmId,
    pub title: String,
    pub event_date: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AgendaEvent {
    pub fn new(firm_id: FirmId, title: impl Into<String>, event_date: impl Into<String>) -> Self {
        Self {
            id: EventId(Uuid::new_v4()),
            firm_id,
            title: title.into(),
            event_date: event_date.into(),
            notes: None,
            created_at: Utc::now(),
        }
    }
}
