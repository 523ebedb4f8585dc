//! Tracing-based hooks for every loop phase.
//!
//! ```rust
//! use mwagent::LoopHooks;
//! use mwobserve::TracingLoopHooks;
//!
//! fn accepts_loop_hooks(_hooks: &dyn LoopHooks) {}
//!
//! let hooks = TracingLoopHooks;
//! accepts_loop_hooks(&hooks);
//! ```

use std::time::Duration;

use mwagent::{AgentError, LoopHooks, LoopOutcome};
use mwprovider::{BackendId, ToolInvocation, TurnResponse};
use mwtooling::{ToolContext, ToolError};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLoopHooks;

impl LoopHooks for TracingLoopHooks {
    fn on_round_start(&self, backend: BackendId, round: u32) {
        tracing::info!(
            phase = "loop",
            event = "round_start",
            backend = %backend,
            round
        );
    }

    fn on_backend_response(&self, response: &TurnResponse, round: u32) {
        tracing::info!(
            phase = "loop",
            event = "backend_response",
            backend = %response.backend,
            round,
            pending_tool_calls = response.pending_tool_calls,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens
        );
    }

    fn on_tool_dispatch(&self, invocation: &ToolInvocation, context: &ToolContext) {
        tracing::info!(
            phase = "tool",
            event = "dispatch",
            tool_name = invocation.name,
            invocation_id = invocation.id,
            session_id = context.session_id,
            trace_id = context.trace_id.as_deref()
        );
    }

    fn on_tool_result(
        &self,
        invocation: &ToolInvocation,
        result: &Result<Value, ToolError>,
        elapsed: Duration,
    ) {
        match result {
            Ok(_) => tracing::info!(
                phase = "tool",
                event = "result",
                tool_name = invocation.name,
                invocation_id = invocation.id,
                elapsed_ms = elapsed.as_millis() as u64
            ),
            Err(error) => tracing::error!(
                phase = "tool",
                event = "failure",
                tool_name = invocation.name,
                invocation_id = invocation.id,
                elapsed_ms = elapsed.as_millis() as u64,
                error_kind = ?error.kind,
                retryable = error.retryable,
                error = %error
            ),
        }
    }

    fn on_loop_complete(&self, outcome: &LoopOutcome, rounds: u32) {
        tracing::info!(
            phase = "loop",
            event = "complete",
            rounds,
            tools_used = outcome.tools_used.len(),
            total_tokens = outcome.usage.total()
        );
    }

    fn on_loop_failure(&self, error: &AgentError, rounds: u32) {
        tracing::error!(
            phase = "loop",
            event = "failure",
            rounds,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}
