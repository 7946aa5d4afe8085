//! One conversation turn, end to end: transcript in, provider completion,
//! decode, classify, confirm or execute, transcript out.

use tracing::{info, warn};

use docket_core::classify::{classify, ExecutionMode};
use docket_core::confirm::{read_reply, ConfirmReply, ConfirmState, ConfirmationMachine};
use docket_core::diagnose::diagnose;
use docket_core::errors::ApplicationError;
use docket_core::intent::{AssistantReply, ChatMessage, Intent};
use docket_db::repositories::RepositoryError;

use crate::actions::{ActionContext, ActionRegistry};
use crate::chain;
use crate::extract::extract_reply;
use crate::gateway::ProviderGateway;
use crate::prompts;
use crate::transcript::MemoryLog;

/// What one user turn produced, shaped for the caller's display loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Plain conversation, or a provider failure surfaced as text.
    Reply { text: String },
    /// A mutation is parked; the user must answer before anything runs.
    ConfirmationRequested { prompt: String },
    /// One action ran. `lines` is its result or diagnosis; `follow_up` is the
    /// confirmation prompt for a chained next step, when one was parked.
    ActionsCompleted { lines: Vec<String>, follow_up: Option<String> },
}

pub struct SessionRuntime {
    gateway: ProviderGateway,
    transcript: MemoryLog,
    registry: ActionRegistry,
    context: ActionContext,
    machine: ConfirmationMachine,
    system_prompt: String,
}

impl SessionRuntime {
    pub fn new(
        firm_name: &str,
        gateway: ProviderGateway,
        transcript: MemoryLog,
        registry: ActionRegistry,
        context: ActionContext,
    ) -> Self {
        Self {
            gateway,
            transcript,
            registry,
            context,
            machine: ConfirmationMachine::new(),
            system_prompt: prompts::build_system_prompt(firm_name),
        }
    }

    pub fn provider_tag(&self) -> &'static str {
        self.gateway.provider_tag()
    }

    /// The confirmation question currently awaiting an answer, if any.
    pub fn pending_confirmation(&self) -> Option<String> {
        self.machine.pending().map(|pending| pending.intent.confirmation_text())
    }

    pub async fn clear_transcript(&mut self) -> Result<(), ApplicationError> {
        self.transcript.clear().await.map_err(persistence)
    }

    /// Runs one user turn. Only persistence faults surface as `Err`; provider
    /// outages and failed actions come back as displayable outcomes.
    pub async fn handle_message(&mut self, text: &str) -> Result<TurnOutcome, ApplicationError> {
        if self.machine.state() == ConfirmState::Proposed {
            match read_reply(text) {
                ConfirmReply::Affirmative => {
                    if let Some(pending) = self.machine.begin_execution() {
                        self.transcript
                            .append(ChatMessage::user(text))
                            .await
                            .map_err(persistence)?;
                        return self.execute_step(pending.intent).await;
                    }
                }
                ConfirmReply::Negative => {
                    if let Some(pending) = self.machine.cancel() {
                        self.transcript
                            .append(ChatMessage::user(text))
                            .await
                            .map_err(persistence)?;
                        let reply = format!(
                            "Cancelled `{}`; nothing was changed.",
                            pending.intent.action
                        );
                        self.transcript
                            .append(ChatMessage::assistant(reply.clone(), None))
                            .await
                            .map_err(persistence)?;
                        return Ok(TurnOutcome::Reply { text: reply });
                    }
                }
                // An unrelated question keeps the proposal parked and goes to
                // the model like any other turn.
                ConfirmReply::Unrelated => {}
            }
        }

        let history = self.transcript.messages().to_vec();
        self.transcript.append(ChatMessage::user(text)).await.map_err(persistence)?;

        let completion = match self.gateway.complete(&self.system_prompt, &history, text).await
        {
            Ok(completion) => completion,
            // The raw provider error is the reply; the next turn retries.
            Err(error) => return Ok(TurnOutcome::Reply { text: error.to_string() }),
        };
        self.transcript
            .append(ChatMessage::assistant(
                completion.clone(),
                Some(self.gateway.provider_tag().to_string()),
            ))
            .await
            .map_err(persistence)?;

        match extract_reply(&completion) {
            AssistantReply::Message { text } => Ok(TurnOutcome::Reply { text }),
            AssistantReply::Action { intent } => match classify(&intent) {
                ExecutionMode::Auto => self.execute_step(intent).await,
                ExecutionMode::ConfirmFirst => {
                    let prompt = match &intent.intro_text {
                        Some(intro) => format!("{intro}\n\n{}", intent.confirmation_text()),
                        None => intent.confirmation_text(),
                    };
                    info!(action = %intent.action, "confirm.intent_proposed");
                    if let Some(replaced) = self.machine.propose(intent) {
                        warn!(replaced = %replaced.action, "confirm.intent_replaced");
                    }
                    Ok(TurnOutcome::ConfirmationRequested { prompt })
                }
            },
        }
    }

    /// Runs one intent. A success may park the next chained step for its own
    /// confirmation; steps never run back to back. A failure is diagnosed and
    /// ends the chain with nothing pending.
    async fn execute_step(&mut self, intent: Intent) -> Result<TurnOutcome, ApplicationError> {
        let mut lines: Vec<String> = Vec::new();
        if let Some(intro) = &intent.intro_text {
            lines.push(intro.clone());
        }

        let report = self.registry.execute(&self.context, &intent).await;
        let mut follow_up = None;

        if report.success {
            info!(action = %intent.action, "session.action_completed");
            if let Some(message) = &report.message {
                lines.push(message.clone());
            }
            if let Some(next) = chain::next_intent(&intent, &report) {
                info!(action = %next.action, depth = next.chain_depth(), "chain.step_proposed");
                let prompt = next.confirmation_text();
                if let Some(replaced) = self.machine.propose(next) {
                    warn!(replaced = %replaced.action, "confirm.intent_replaced");
                }
                follow_up = Some(prompt);
            }
        } else {
            let raw_error = report.error.as_deref().unwrap_or("unknown error");
            warn!(action = %intent.action, error = raw_error, "session.action_failed");
            lines.push(diagnose(&intent.action, &intent.params, raw_error).to_message());
        }

        let mut stored = lines.join("\n");
        if let Some(prompt) = &follow_up {
            if stored.is_empty() {
                stored = prompt.clone();
            } else {
                stored.push('\n');
                stored.push_str(prompt);
            }
        }
        self.transcript
            .append(ChatMessage::assistant(stored, None))
            .await
            .map_err(persistence)?;
        Ok(TurnOutcome::ActionsCompleted { lines, follow_up })
    }
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}
