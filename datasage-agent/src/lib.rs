//! Datasage Agent - Question Orchestration
//!
//! Drives the bounded generate -> validate -> execute state machine for
//! one question: model calls through an injected [`ModelProvider`],
//! execution against a [`SandboxSession`], and an ordered milestone log
//! of everything that happened.
//!
//! [`ModelProvider`]: datasage_llm::ModelProvider
//! [`SandboxSession`]: datasage_store::SandboxSession

pub mod machine;
pub mod orchestrator;

pub use datasage_core::MAX_ITERATIONS;
pub use orchestrator::{AgentRequest, Orchestrator, RunOutcome};
