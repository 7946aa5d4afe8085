//! Session runtime - LLM-mediated intent extraction and orchestration
//!
//! This crate is the conversational layer of docket. It turns free-form chat
//! into structured intents, holds mutations behind an explicit confirmation
//! exchange, and dispatches confirmed work against the practice repositories.
//!
//! # Architecture
//!
//! Each user turn moves through a fixed loop:
//! 1. **Completion** (`gateway`) - send the rolling transcript plus the new
//!    message to the provider selected at session start
//! 2. **Extraction** (`extract`) - decode the reply into prose or an intent,
//!    tolerating fenced blocks and surrounding commentary
//! 3. **Classification** - read-only intents run at once; mutations are parked
//!    until the user answers yes or no
//! 4. **Execution** (`actions`) - registry dispatch against the repositories,
//!    with natural-key resolution and a plain-language failure diagnosis
//! 5. **Chaining** (`chain`) - follow-up intents carried in metadata run after
//!    their parent, inheriting the identifiers it produced
//!
//! # Key Types
//!
//! - `SessionRuntime` - main orchestrator (see `runtime` module)
//! - `LlmClient` - pluggable trait for OpenAI/Anthropic/Ollama
//! - `ActionRegistry` - the closed set of operations the model may request
//!
//! # Safety Principle
//!
//! The LLM is strictly a translator. It never writes to the record store and
//! never decides whether a mutation happens. Every write goes through a named
//! handler, resolves real rows, and waits for the user's explicit yes.

pub mod actions;
pub mod chain;
pub mod extract;
pub mod gateway;
pub mod llm;
pub mod prompts;
pub mod runtime;
pub mod transcript;

pub use gateway::ProviderGateway;
pub use llm::LlmClient;
pub use runtime::{SessionRuntime, TurnOutcome};
pub use transcript::MemoryLog;
