use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::intent::Intent;

/// Replies that settle a pending confirmation. Matching is whole-phrase
/// against the tables below; anything else is an unrelated utterance and the
/// pending intent stays parked.
const AFFIRMATIVE_PHRASES: &[&str] = &[
    "yes", "y", "yeah", "yep", "sure", "ok", "okay", "confirm", "confirmed", "do it", "go ahead",
    "proceed", "sounds good", "affirmative", "please do",
];

const NEGATIVE_PHRASES: &[&str] = &[
    "no", "n", "nope", "cancel", "stop", "abort", "don't", "do not", "never mind", "nevermind",
    "forget it", "negative", "leave it",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmState {
    Idle,
    Proposed,
    Executing,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmEvent {
    IntentProposed,
    UserAffirmed,
    UserDeclined,
    ExecutionSettled,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfirmTransitionError {
    #[error("invalid confirmation transition from {state:?} using event {event:?}")]
    InvalidTransition { state: ConfirmState, event: ConfirmEvent },
}

/// The confirmation graph. `Executing` and `Cancelled` are transient: both
/// settle back to `Idle` once the surrounding turn finishes. Proposing over
/// an existing proposal replaces it; there is no queue.
pub fn transition(
    current: ConfirmState,
    event: ConfirmEvent,
) -> Result<ConfirmState, ConfirmTransitionError> {
    use ConfirmEvent::{ExecutionSettled, IntentProposed, UserAffirmed, UserDeclined};
    use ConfirmState::{Cancelled, Executing, Idle, Proposed};

    match (current, event) {
        (Idle, IntentProposed) | (Proposed, IntentProposed) => Ok(Proposed),
        (Proposed, UserAffirmed) => Ok(Executing),
        (Proposed, UserDeclined) => Ok(Cancelled),
        (Executing, ExecutionSettled) | (Cancelled, ExecutionSettled) => Ok(Idle),
        (state, event) => Err(ConfirmTransitionError::InvalidTransition { state, event }),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmReply {
    Affirmative,
    Negative,
    Unrelated,
}

/// Reads a user utterance against the phrase tables.
pub fn read_reply(text: &str) -> ConfirmReply {
    let token = normalize_reply_token(text);
    if AFFIRMATIVE_PHRASES.contains(&token.as_str()) {
        ConfirmReply::Affirmative
    } else if NEGATIVE_PHRASES.contains(&token.as_str()) {
        ConfirmReply::Negative
    } else {
        ConfirmReply::Unrelated
    }
}

fn normalize_reply_token(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!', '?'])
        .trim()
        .to_ascii_lowercase()
}

#[derive(Clone, Debug, PartialEq)]
pub struct PendingIntent {
    pub intent: Intent,
    pub proposed_at: DateTime<Utc>,
}

/// Holds at most one intent awaiting user confirmation.
#[derive(Debug, Default)]
pub struct ConfirmationMachine {
    pending: Option<PendingIntent>,
}

impl ConfirmationMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConfirmState {
        if self.pending.is_some() {
            ConfirmState::Proposed
        } else {
            ConfirmState::Idle
        }
    }

    pub fn pending(&self) -> Option<&PendingIntent> {
        self.pending.as_ref()
    }

    /// Parks an intent for confirmation. Returns the intent it displaced, if
    /// the slot was already occupied.
    pub fn propose(&mut self, intent: Intent) -> Option<Intent> {
        let replaced = self.pending.take().map(|pending| pending.intent);
        self.pending = Some(PendingIntent { intent, proposed_at: Utc::now() });
        replaced
    }

    /// Hands the pending intent to the caller for execution and settles the
    /// slot back to idle. Returns `None` when nothing is pending, which makes
    /// a stray confirm a no-op.
    pub fn begin_execution(&mut self) -> Option<PendingIntent> {
        transition(self.state(), ConfirmEvent::UserAffirmed).ok()?;
        self.pending.take()
    }

    /// Drops the pending intent. Returns it so the caller can report what was
    /// cancelled. `None` when nothing was pending.
    pub fn cancel(&mut self) -> Option<PendingIntent> {
        transition(self.state(), ConfirmEvent::UserDeclined).ok()?;
        self.pending.take()
    }
}
