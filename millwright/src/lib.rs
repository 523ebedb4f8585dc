//! Unified facade over the millwright workspace crates.
//!
//! This crate is designed to be the single dependency for most applications:
//! it re-exports the core crates and provides convenience constructors for
//! building backends and wiring them into an agent loop.
//!
//! ```rust
//! use millwright::prelude::*;
//!
//! let registry = ToolRegistry::new();
//! assert!(registry.is_empty());
//! ```

pub mod backends;
pub mod prelude;
pub mod util;

pub use mwagent;
pub use mwobserve;
pub use mwprovider;
pub use mwtooling;

pub use mwagent::{
    AgentError, AgentErrorKind, AgentLoop, AgentLoopBuilder, ChatTurnRequest,
    DEFAULT_MAX_TOOL_ROUNDS, LoopHooks, LoopOutcome, NO_ANSWER_PLACEHOLDER, NoopLoopHooks,
};
pub use mwobserve::{MetricsLoopHooks, SafeLoopHooks, TracingLoopHooks};
pub use mwprovider::{
    BackendCredentialStore, BackendError, BackendErrorKind, BackendFuture, BackendId,
    BackendRegistry, ChatBackend, ContentBlock, ConversationTurn, Role, SecretString, TokenUsage,
    ToolInvocation, ToolSpec, TurnRequest, TurnResponse,
};
pub use mwtooling::{
    FunctionTool, Tool, ToolContext, ToolDispatcher, ToolError, ToolErrorKind, ToolFuture,
    ToolRegistry, optional_u64, require_object, required_string,
};

pub use backends::{
    BackendBuildConfig, build_backend_from_api_key, build_backend_with_config,
};
pub use util::{agent, assistant_turn, image_turn, parse_backend_id, user_turn};
