use std::sync::{Arc, Mutex};
use std::time::Duration;

use mwagent::{AgentError, AgentErrorKind, LoopHooks, LoopOutcome};
use mwprovider::{BackendId, TokenUsage, ToolInvocation, TurnResponse};
use mwtooling::{ToolContext, ToolError};
use serde_json::{Value, json};

use crate::{MetricsLoopHooks, SafeLoopHooks, TracingLoopHooks};

fn sample_invocation() -> ToolInvocation {
    ToolInvocation {
        id: "call_1".to_string(),
        name: "search_equipment".to_string(),
        arguments: json!({"query": "P-12"}),
    }
}

fn sample_response(pending: bool) -> TurnResponse {
    TurnResponse {
        backend: BackendId::Anthropic,
        model: "claude-sonnet-4-5".to_string(),
        content: Vec::new(),
        pending_tool_calls: pending,
        usage: TokenUsage {
            input_tokens: 12,
            output_tokens: 4,
        },
    }
}

fn sample_outcome() -> LoopOutcome {
    LoopOutcome {
        final_text: "Found pump P-12.".to_string(),
        tools_used: vec!["search_equipment".to_string()],
        usage: TokenUsage::default(),
    }
}

fn exercise_all_callbacks(hooks: &dyn LoopHooks) {
    let invocation = sample_invocation();
    let context = ToolContext::new("session-1").with_trace_id("trace-1");
    let success: Result<Value, ToolError> = Ok(json!({"id": "p-12-uuid"}));
    let failure: Result<Value, ToolError> = Err(ToolError::execution("tool failed"));

    hooks.on_round_start(BackendId::Anthropic, 0);
    hooks.on_backend_response(&sample_response(true), 0);
    hooks.on_tool_dispatch(&invocation, &context);
    hooks.on_tool_result(&invocation, &success, Duration::from_millis(20));
    hooks.on_tool_result(&invocation, &failure, Duration::from_millis(20));
    hooks.on_loop_complete(&sample_outcome(), 1);
    hooks.on_loop_failure(
        &AgentError::new(AgentErrorKind::ToolRoundLimit, "budget spent", false),
        10,
    );
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    exercise_all_callbacks(&TracingLoopHooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    exercise_all_callbacks(&MetricsLoopHooks);
}

#[derive(Default, Clone)]
struct RecordingHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl LoopHooks for RecordingHooks {
    fn on_round_start(&self, _backend: BackendId, _round: u32) {
        self.events.lock().expect("events lock").push("round_start");
    }

    fn on_backend_response(&self, _response: &TurnResponse, _round: u32) {
        self.events.lock().expect("events lock").push("response");
    }

    fn on_tool_dispatch(&self, _invocation: &ToolInvocation, _context: &ToolContext) {
        self.events.lock().expect("events lock").push("dispatch");
    }

    fn on_tool_result(
        &self,
        _invocation: &ToolInvocation,
        _result: &Result<Value, ToolError>,
        _elapsed: Duration,
    ) {
        self.events.lock().expect("events lock").push("result");
    }

    fn on_loop_complete(&self, _outcome: &LoopOutcome, _rounds: u32) {
        self.events.lock().expect("events lock").push("complete");
    }

    fn on_loop_failure(&self, _error: &AgentError, _rounds: u32) {
        self.events.lock().expect("events lock").push("failure");
    }
}

struct PanicHooks;

impl LoopHooks for PanicHooks {
    fn on_round_start(&self, _backend: BackendId, _round: u32) {
        panic!("round_start panic");
    }

    fn on_backend_response(&self, _response: &TurnResponse, _round: u32) {
        panic!("response panic");
    }

    fn on_tool_dispatch(&self, _invocation: &ToolInvocation, _context: &ToolContext) {
        panic!("dispatch panic");
    }

    fn on_tool_result(
        &self,
        _invocation: &ToolInvocation,
        _result: &Result<Value, ToolError>,
        _elapsed: Duration,
    ) {
        panic!("result panic");
    }

    fn on_loop_complete(&self, _outcome: &LoopOutcome, _rounds: u32) {
        panic!("complete panic");
    }

    fn on_loop_failure(&self, _error: &AgentError, _rounds: u32) {
        panic!("failure panic");
    }
}

#[test]
fn safe_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);
    let hooks = SafeLoopHooks::new(inner);

    exercise_all_callbacks(&hooks);

    assert_eq!(events.lock().expect("events lock").len(), 7);
}

#[test]
fn safe_hooks_swallow_panics() {
    let hooks = SafeLoopHooks::new(PanicHooks);
    exercise_all_callbacks(&hooks);
}
