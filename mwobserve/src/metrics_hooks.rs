//! Metrics-based hooks for every loop phase.
//!
//! ```rust
//! use mwagent::LoopHooks;
//! use mwobserve::MetricsLoopHooks;
//!
//! fn accepts_loop_hooks(_hooks: &dyn LoopHooks) {}
//!
//! let hooks = MetricsLoopHooks;
//! accepts_loop_hooks(&hooks);
//! ```

use std::time::Duration;

use mwagent::{AgentError, LoopHooks, LoopOutcome};
use mwprovider::{BackendId, ToolInvocation, TurnResponse};
use mwtooling::{ToolContext, ToolError};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsLoopHooks;

impl LoopHooks for MetricsLoopHooks {
    fn on_round_start(&self, backend: BackendId, _round: u32) {
        metrics::counter!(
            "millwright_loop_round_start_total",
            "backend" => backend.to_string()
        )
        .increment(1);
    }

    fn on_backend_response(&self, response: &TurnResponse, _round: u32) {
        metrics::counter!(
            "millwright_backend_response_total",
            "backend" => response.backend.to_string(),
            "pending" => response.pending_tool_calls.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "millwright_backend_response_tokens",
            "backend" => response.backend.to_string()
        )
        .record(response.usage.total() as f64);
    }

    fn on_tool_dispatch(&self, invocation: &ToolInvocation, _context: &ToolContext) {
        metrics::counter!(
            "millwright_tool_dispatch_total",
            "tool_name" => invocation.name.clone()
        )
        .increment(1);
    }

    fn on_tool_result(
        &self,
        invocation: &ToolInvocation,
        result: &Result<Value, ToolError>,
        elapsed: Duration,
    ) {
        let status = match result {
            Ok(_) => "success",
            Err(_) => "failure",
        };

        if let Err(error) = result {
            metrics::counter!(
                "millwright_tool_failure_total",
                "tool_name" => invocation.name.clone(),
                "error_kind" => format!("{:?}", error.kind)
            )
            .increment(1);
        }

        metrics::histogram!(
            "millwright_tool_duration_seconds",
            "tool_name" => invocation.name.clone(),
            "status" => status
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_loop_complete(&self, outcome: &LoopOutcome, rounds: u32) {
        metrics::counter!("millwright_loop_outcome_total", "status" => "complete").increment(1);
        metrics::histogram!("millwright_loop_rounds").record(rounds as f64);
        metrics::histogram!("millwright_loop_tools_used").record(outcome.tools_used.len() as f64);
    }

    fn on_loop_failure(&self, error: &AgentError, rounds: u32) {
        metrics::counter!(
            "millwright_loop_outcome_total",
            "status" => "failure",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("millwright_loop_rounds").record(rounds as f64);
    }
}
