//! Core logic of the conversation orchestrator: the message log, prompt
//! assembly, retrying throttled requests, debouncing user intents and
//! gating the opening greeting.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod actor;
mod config;
pub mod conversation;
mod debounce;
mod greeting;
mod model_client;
mod orchestrator;
mod prompt;
mod retry;
pub mod store;

pub use actor::ActorDeadError;
pub use config::{FallbackMessages, OrchestratorConfig};
pub use greeting::{FIRST_VISIT_KEY, LAST_VISIT_KEY};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, StateChange};
pub use retry::RetryPolicy;
