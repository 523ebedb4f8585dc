use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use mwagent::{AgentError, LoopHooks, LoopOutcome};
use mwprovider::{BackendId, ToolInvocation, TurnResponse};
use mwtooling::{ToolContext, ToolError};
use serde_json::Value;

/// Wraps another hook implementation so a panicking callback never takes the
/// loop down with it.
pub struct SafeLoopHooks<H> {
    inner: H,
}

impl<H> SafeLoopHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> LoopHooks for SafeLoopHooks<H>
where
    H: LoopHooks,
{
    fn on_round_start(&self, backend: BackendId, round: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_round_start(backend, round)
        }));
    }

    fn on_backend_response(&self, response: &TurnResponse, round: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_backend_response(response, round)
        }));
    }

    fn on_tool_dispatch(&self, invocation: &ToolInvocation, context: &ToolContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_tool_dispatch(invocation, context)
        }));
    }

    fn on_tool_result(
        &self,
        invocation: &ToolInvocation,
        result: &Result<Value, ToolError>,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_tool_result(invocation, result, elapsed)
        }));
    }

    fn on_loop_complete(&self, outcome: &LoopOutcome, rounds: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_loop_complete(outcome, rounds)
        }));
    }

    fn on_loop_failure(&self, error: &AgentError, rounds: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_loop_failure(error, rounds)
        }));
    }
}
