use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mwagent::{AgentErrorKind, AgentLoop, ChatTurnRequest, NO_ANSWER_PLACEHOLDER};
use mwprovider::{
    BackendError, BackendFuture, BackendId, ChatBackend, ContentBlock, ConversationTurn, Role,
    TokenUsage, ToolSpec, TurnRequest, TurnResponse,
};
use mwtooling::{ToolContext, ToolDispatcher, ToolError, ToolRegistry};
use serde_json::{Value, json};

/// Replays a fixed response script and records every request it receives.
struct ScriptedBackend {
    script: Mutex<VecDeque<Result<TurnResponse, BackendError>>>,
    requests: Mutex<Vec<TurnRequest>>,
}

impl ScriptedBackend {
    fn new(script: Vec<Result<TurnResponse, BackendError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    fn request(&self, index: usize) -> TurnRequest {
        self.requests.lock().expect("requests lock")[index].clone()
    }
}

impl ChatBackend for ScriptedBackend {
    fn id(&self) -> BackendId {
        BackendId::Anthropic
    }

    fn send<'a>(
        &'a self,
        request: TurnRequest,
    ) -> BackendFuture<'a, Result<TurnResponse, BackendError>> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .expect("script should not be exhausted")
        })
    }

    fn probe<'a>(&'a self) -> BackendFuture<'a, bool> {
        Box::pin(async { true })
    }
}

/// Reports a pending tool call on every round, forever.
struct AlwaysPendingBackend {
    calls: AtomicUsize,
}

impl AlwaysPendingBackend {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl ChatBackend for AlwaysPendingBackend {
    fn id(&self) -> BackendId {
        BackendId::OpenAi
    }

    fn send<'a>(
        &'a self,
        _request: TurnRequest,
    ) -> BackendFuture<'a, Result<TurnResponse, BackendError>> {
        Box::pin(async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(tool_call_response(&[(
                &format!("call_{call}"),
                "search_equipment",
            )]))
        })
    }

    fn probe<'a>(&'a self) -> BackendFuture<'a, bool> {
        Box::pin(async { true })
    }
}

fn tool_call_response(calls: &[(&str, &str)]) -> TurnResponse {
    let content = calls
        .iter()
        .map(|(id, name)| ContentBlock::tool_use(*id, *name, json!({"query": "P-12"})))
        .collect();

    TurnResponse {
        backend: BackendId::Anthropic,
        model: "claude-sonnet-4-5".to_string(),
        content,
        pending_tool_calls: true,
        usage: TokenUsage::default(),
    }
}

fn final_response(text: &str) -> TurnResponse {
    TurnResponse {
        backend: BackendId::Anthropic,
        model: "claude-sonnet-4-5".to_string(),
        content: vec![ContentBlock::text(text)],
        pending_tool_calls: false,
        usage: TokenUsage {
            input_tokens: 20,
            output_tokens: 6,
        },
    }
}

fn search_equipment_spec() -> ToolSpec {
    ToolSpec::new(
        "search_equipment",
        "Search the equipment register",
        json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        }),
    )
}

fn dispatcher_with<F>(register: F) -> ToolDispatcher
where
    F: FnOnce(&mut ToolRegistry),
{
    let mut registry = ToolRegistry::new();
    register(&mut registry);
    ToolDispatcher::new(Arc::new(registry))
}

#[tokio::test]
async fn single_tool_round_produces_final_answer_and_audit_trail() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(tool_call_response(&[("call_1", "search_equipment")])),
        Ok(final_response("Found pump P-12.")),
    ]));

    let dispatcher = dispatcher_with(|registry| {
        registry.register_fn(search_equipment_spec(), |arguments, _ctx| async move {
            assert_eq!(arguments["query"], "P-12");
            Ok(json!({"id": "p-12-uuid"}))
        });
    });

    let agent = AgentLoop::builder(backend.clone(), dispatcher)
        .model("claude-sonnet-4-5")
        .build()
        .expect("builder should succeed");

    let outcome = agent
        .run(
            ChatTurnRequest::new("find pump P-12")
                .with_system_prompt("You are a maintenance assistant.")
                .with_tools(vec![search_equipment_spec()])
                .with_context(ToolContext::new("session-1")),
        )
        .await
        .expect("loop should complete");

    assert_eq!(outcome.final_text, "Found pump P-12.");
    assert_eq!(outcome.tools_used, vec!["search_equipment"]);
    assert_eq!(outcome.usage.total(), 26);

    assert_eq!(backend.request_count(), 2);

    // Round 1 must replay the assistant's tool-call request and carry the
    // dispatcher output back in a user-role turn.
    let second = backend.request(1);
    assert_eq!(
        second.system_prompt.as_deref(),
        Some("You are a maintenance assistant.")
    );
    assert_eq!(second.tools.len(), 1);
    assert_eq!(second.history.len(), 3);
    assert_eq!(second.history[1].role, Role::Assistant);
    assert_eq!(second.history[2].role, Role::User);
    assert_eq!(
        second.history[2].content[0],
        ContentBlock::tool_result("call_1", "search_equipment", json!({"id": "p-12-uuid"}), false)
    );
}

#[tokio::test]
async fn exhausted_round_budget_is_fatal() {
    let backend = Arc::new(AlwaysPendingBackend::new());
    let dispatched = Arc::new(AtomicUsize::new(0));
    let dispatched_in_tool = Arc::clone(&dispatched);

    let dispatcher = dispatcher_with(|registry| {
        registry.register_fn(search_equipment_spec(), move |_arguments, _ctx| {
            let dispatched = Arc::clone(&dispatched_in_tool);
            async move {
                dispatched.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"id": "p-12-uuid"}))
            }
        });
    });

    let agent = AgentLoop::builder(backend.clone(), dispatcher)
        .model("gpt-4o")
        .max_tool_rounds(2)
        .build()
        .expect("builder should succeed");

    let error = agent
        .run(ChatTurnRequest::new("find pump P-12").with_tools(vec![search_equipment_spec()]))
        .await
        .expect_err("budget exhaustion must fail");

    assert_eq!(error.kind, AgentErrorKind::ToolRoundLimit);
    // Exactly two tool-processing rounds ran before the third pending
    // response tripped the budget.
    assert_eq!(dispatched.load(Ordering::SeqCst), 2);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failing_tool_does_not_block_sibling_calls() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(tool_call_response(&[
            ("call_a", "get_service_history"),
            ("call_b", "search_equipment"),
        ])),
        Ok(final_response("Here is what I found.")),
    ]));

    let dispatcher = dispatcher_with(|registry| {
        registry.register_fn(
            ToolSpec::new("get_service_history", "Service records", json!({"type": "object"})),
            |_arguments, _ctx| async move { Err(ToolError::execution("records backend offline")) },
        );
        registry.register_fn(search_equipment_spec(), |_arguments, _ctx| async move {
            Ok(json!({"id": "p-12-uuid"}))
        });
    });

    let agent = AgentLoop::builder(backend.clone(), dispatcher)
        .model("claude-sonnet-4-5")
        .build()
        .expect("builder should succeed");

    let outcome = agent
        .run(ChatTurnRequest::new("find pump P-12"))
        .await
        .expect("loop should complete");

    assert_eq!(
        outcome.tools_used,
        vec!["get_service_history", "search_equipment"]
    );

    let results = &backend.request(1).history[2].content;
    assert_eq!(results.len(), 2);
    match &results[0] {
        ContentBlock::ToolResult {
            id,
            is_error,
            payload,
            ..
        } => {
            assert_eq!(id.as_str(), "call_a");
            assert!(*is_error);
            let message = payload.as_str().expect("error payload should be text");
            assert!(message.contains("records backend offline"));
        }
        other => panic!("expected tool result, got {other:?}"),
    }
    match &results[1] {
        ContentBlock::ToolResult { id, is_error, .. } => {
            assert_eq!(id.as_str(), "call_b");
            assert!(!*is_error);
        }
        other => panic!("expected tool result, got {other:?}"),
    }
}

#[tokio::test]
async fn multi_call_turns_preserve_request_order() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(tool_call_response(&[
            ("call_1", "alpha"),
            ("call_2", "beta"),
            ("call_3", "gamma"),
        ])),
        Ok(final_response("done")),
    ]));

    let dispatcher = dispatcher_with(|registry| {
        for name in ["alpha", "beta", "gamma"] {
            registry.register_fn(
                ToolSpec::new(name, "test tool", json!({"type": "object"})),
                |_arguments, _ctx| async move { Ok(Value::Null) },
            );
        }
    });

    let agent = AgentLoop::builder(backend, dispatcher)
        .model("claude-sonnet-4-5")
        .build()
        .expect("builder should succeed");

    let outcome = agent
        .run(ChatTurnRequest::new("run all three"))
        .await
        .expect("loop should complete");

    assert_eq!(outcome.tools_used, vec!["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn unknown_tool_becomes_error_result_not_loop_failure() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(tool_call_response(&[("call_1", "not_registered")])),
        Ok(final_response("I could not run that tool.")),
    ]));

    let agent = AgentLoop::builder(backend.clone(), dispatcher_with(|_registry| {}))
        .model("claude-sonnet-4-5")
        .build()
        .expect("builder should succeed");

    let outcome = agent
        .run(ChatTurnRequest::new("find pump P-12"))
        .await
        .expect("loop should survive an unknown tool");

    assert_eq!(outcome.tools_used, vec!["not_registered"]);
    match &backend.request(1).history[2].content[0] {
        ContentBlock::ToolResult { is_error, .. } => assert!(*is_error),
        other => panic!("expected tool result, got {other:?}"),
    }
}

#[tokio::test]
async fn pending_without_decoded_calls_resends_instead_of_stalling() {
    let stalled = TurnResponse {
        backend: BackendId::Anthropic,
        model: "claude-sonnet-4-5".to_string(),
        content: vec![ContentBlock::text("let me check")],
        pending_tool_calls: true,
        usage: TokenUsage::default(),
    };

    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(stalled),
        Ok(final_response("Nothing to run after all.")),
    ]));

    let agent = AgentLoop::builder(backend.clone(), dispatcher_with(|_registry| {}))
        .model("claude-sonnet-4-5")
        .build()
        .expect("builder should succeed");

    let outcome = agent
        .run(ChatTurnRequest::new("find pump P-12"))
        .await
        .expect("loop should recover from the stall");

    assert_eq!(outcome.final_text, "Nothing to run after all.");
    assert!(outcome.tools_used.is_empty());
    assert_eq!(backend.request_count(), 2);

    // The assistant turn is replayed but no empty results turn is injected.
    let second = backend.request(1);
    assert_eq!(second.history.len(), 2);
    assert_eq!(second.history[1].role, Role::Assistant);
}

#[tokio::test]
async fn empty_final_text_becomes_placeholder() {
    let empty_final = TurnResponse {
        backend: BackendId::Anthropic,
        model: "claude-sonnet-4-5".to_string(),
        content: Vec::new(),
        pending_tool_calls: false,
        usage: TokenUsage::default(),
    };

    let backend = Arc::new(ScriptedBackend::new(vec![Ok(empty_final)]));
    let agent = AgentLoop::builder(backend, dispatcher_with(|_registry| {}))
        .model("claude-sonnet-4-5")
        .build()
        .expect("builder should succeed");

    let outcome = agent
        .run(ChatTurnRequest::new("find pump P-12"))
        .await
        .expect("loop should complete");

    assert_eq!(outcome.final_text, NO_ANSWER_PLACEHOLDER);
}

#[tokio::test]
async fn backend_failures_surface_with_mapped_kind() {
    let backend = Arc::new(ScriptedBackend::new(vec![Err(
        BackendError::authentication("no Anthropic credentials configured"),
    )]));

    let agent = AgentLoop::builder(backend, dispatcher_with(|_registry| {}))
        .model("claude-sonnet-4-5")
        .build()
        .expect("builder should succeed");

    let error = agent
        .run(ChatTurnRequest::new("find pump P-12"))
        .await
        .expect_err("auth failure must propagate");

    assert_eq!(error.kind, AgentErrorKind::Authentication);
    assert!(error.message.contains("credentials"));
}
