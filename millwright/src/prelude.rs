//! Common imports for most millwright applications.

pub use crate::{
    BackendBuildConfig, build_backend_from_api_key, build_backend_with_config,
};
pub use crate::{agent, assistant_turn, image_turn, parse_backend_id, user_turn};
pub use crate::{
    AgentError, AgentErrorKind, AgentLoop, AgentLoopBuilder, BackendCredentialStore, BackendError,
    BackendErrorKind, BackendFuture, BackendId, BackendRegistry, ChatBackend, ChatTurnRequest,
    ContentBlock, ConversationTurn, FunctionTool, LoopHooks, LoopOutcome, MetricsLoopHooks,
    NoopLoopHooks, Role, SafeLoopHooks, SecretString, TokenUsage, Tool, ToolContext,
    ToolDispatcher, ToolError, ToolErrorKind, ToolInvocation, ToolRegistry, ToolSpec,
    TracingLoopHooks, TurnRequest, TurnResponse,
};
