//! Orchestration of one agentic chat invocation: backend rounds interleaved
//! with tool dispatch, bounded by a tool-round budget, producing a final
//! answer plus an audit trail.

mod error;
mod hooks;
mod orchestrator;
mod types;

pub mod prelude {
    pub use crate::{
        AgentError, AgentErrorKind, AgentLoop, AgentLoopBuilder, ChatTurnRequest, LoopHooks,
        LoopOutcome, NoopLoopHooks,
    };
}

pub use error::{AgentError, AgentErrorKind};
pub use hooks::{LoopHooks, NoopLoopHooks};
pub use orchestrator::{AgentLoop, AgentLoopBuilder, DEFAULT_MAX_TOOL_ROUNDS};
pub use types::{ChatTurnRequest, LoopOutcome, NO_ANSWER_PLACEHOLDER};
