pub mod classify;
pub mod config;
pub mod confirm;
pub mod diagnose;
pub mod domain;
pub mod errors;
pub mod identity;
pub mod intent;
pub mod normalize;

pub use classify::{classify, ExecutionMode};
pub use confirm::{ConfirmReply, ConfirmationMachine, PendingIntent};
pub use diagnose::{diagnose, Diagnosis};
pub use domain::case::{Case, CaseId, CaseStatus};
pub use domain::client::{Client, ClientId};
pub use domain::document::{Document, DocumentId, DocumentKind};
pub use domain::event::{AgendaEvent, EventId};
pub use domain::hearing::{Hearing, HearingId};
pub use domain::FirmId;
pub use errors::{ApplicationError, DomainError};
pub use intent::{ActionReport, AssistantReply, ChatMessage, ChatRole, Intent};
