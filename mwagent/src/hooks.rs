//! Lifecycle hooks for loop observability.
//!
//! ```rust
//! use mwagent::{LoopHooks, NoopLoopHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn LoopHooks) {}
//!
//! let hooks = NoopLoopHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use mwprovider::{BackendId, ToolInvocation, TurnResponse};
use mwtooling::{ToolContext, ToolError};
use serde_json::Value;

use crate::{AgentError, LoopOutcome};

pub trait LoopHooks: Send + Sync {
    fn on_round_start(&self, _backend: BackendId, _round: u32) {}

    fn on_backend_response(&self, _response: &TurnResponse, _round: u32) {}

    fn on_tool_dispatch(&self, _invocation: &ToolInvocation, _context: &ToolContext) {}

    fn on_tool_result(
        &self,
        _invocation: &ToolInvocation,
        _result: &Result<Value, ToolError>,
        _elapsed: Duration,
    ) {
    }

    fn on_loop_complete(&self, _outcome: &LoopOutcome, _rounds: u32) {}

    fn on_loop_failure(&self, _error: &AgentError, _rounds: u32) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLoopHooks;

impl LoopHooks for NoopLoopHooks {}
