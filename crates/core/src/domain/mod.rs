pub mod case;
pub mod client;
pub mod document;
pub mod event;
pub mod hearing;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant scope. Every record and every transcript row belongs to exactly one firm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FirmId(pub Uuid);

impl FirmId {
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}
