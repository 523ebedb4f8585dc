#![cfg(feature = "backend-openai")]

use mwprovider::adapters::openai::{OpenAiApiResponse, build_api_request, parse_api_response};
use mwprovider::{BackendId, ContentBlock, ConversationTurn, ToolSpec, TurnRequest};
use serde_json::{Value, json};

fn request_json(request: TurnRequest, multimodal: bool) -> Value {
    serde_json::to_value(build_api_request(request, "gpt-4o-mini", multimodal))
        .expect("request should serialize")
}

#[test]
fn system_prompt_becomes_leading_system_message() {
    let request = TurnRequest::new("gpt-4o", vec![ConversationTurn::user("hi")])
        .with_system_prompt("You are a maintenance assistant.");

    let encoded = request_json(request, true);
    assert_eq!(encoded["messages"][0]["role"], "system");
    assert_eq!(
        encoded["messages"][0]["content"],
        "You are a maintenance assistant."
    );
    assert_eq!(encoded["messages"][1]["role"], "user");
    assert_eq!(encoded["messages"][1]["content"], "hi");
}

#[test]
fn tool_schemas_nest_under_function_wrapper_unmodified() {
    let schema = json!({
        "type": "object",
        "properties": { "query": { "type": "string" } },
        "required": ["query"]
    });

    let request = TurnRequest::new("gpt-4o", vec![ConversationTurn::user("hi")]).with_tools(vec![
        ToolSpec::new("search_equipment", "Search the register", schema.clone()),
    ]);

    let encoded = request_json(request, true);
    assert_eq!(encoded["tools"][0]["type"], "function");
    assert_eq!(encoded["tools"][0]["function"]["name"], "search_equipment");
    assert_eq!(encoded["tools"][0]["function"]["parameters"], schema);
}

#[test]
fn images_encode_as_data_urls_when_multimodal() {
    let request = TurnRequest::new(
        "gpt-4o",
        vec![ConversationTurn::user_blocks(vec![
            ContentBlock::text("What model is this?"),
            ContentBlock::image("image/jpeg", "aGVsbG8="),
        ])],
    );

    let encoded = request_json(request, true);
    let parts = &encoded["messages"][0]["content"];
    assert_eq!(parts[0]["type"], "text");
    assert_eq!(parts[0]["text"], "What model is this?");
    assert_eq!(parts[1]["type"], "image_url");
    assert_eq!(
        parts[1]["image_url"]["url"],
        "data:image/jpeg;base64,aGVsbG8="
    );
}

#[test]
fn text_only_endpoints_drop_images_but_keep_text() {
    let request = TurnRequest::new(
        "local-llama",
        vec![ConversationTurn::user_blocks(vec![
            ContentBlock::text("What model is this?"),
            ContentBlock::image("image/jpeg", "aGVsbG8="),
        ])],
    );

    let encoded = request_json(request, false);
    assert_eq!(encoded["messages"][0]["content"], "What model is this?");
}

#[test]
fn tool_results_fan_out_into_tool_role_messages() {
    let request = TurnRequest::new(
        "gpt-4o",
        vec![
            ConversationTurn::user("Is pump P-12 due for service?"),
            ConversationTurn::assistant(vec![ContentBlock::tool_use(
                "call_1",
                "search_equipment",
                json!({"query": "P-12"}),
            )]),
            ConversationTurn::tool_results(vec![
                ContentBlock::tool_result("call_1", "search_equipment", json!({"ok": true}), false),
                ContentBlock::tool_result(
                    "call_2",
                    "get_service_history",
                    json!("backend offline"),
                    true,
                ),
            ]),
        ],
    );

    let encoded = request_json(request, true);
    let assistant = &encoded["messages"][1];
    assert_eq!(assistant["role"], "assistant");
    assert_eq!(assistant["tool_calls"][0]["id"], "call_1");
    assert_eq!(
        assistant["tool_calls"][0]["function"]["arguments"],
        r#"{"query":"P-12"}"#
    );

    let first_result = &encoded["messages"][2];
    assert_eq!(first_result["role"], "tool");
    assert_eq!(first_result["tool_call_id"], "call_1");
    assert_eq!(first_result["content"], r#"{"ok":true}"#);

    let failed_result = &encoded["messages"][3];
    assert_eq!(failed_result["role"], "tool");
    assert_eq!(failed_result["tool_call_id"], "call_2");
    assert_eq!(failed_result["content"], r#"{"error":"backend offline"}"#);
}

#[test]
fn finish_reason_tool_calls_marks_pending_work() {
    let response: OpenAiApiResponse = serde_json::from_value(json!({
        "model": "gpt-4o-2024-08-06",
        "choices": [{
            "message": {
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "search_equipment",
                        "arguments": "{\"query\":\"P-12\"}"
                    }
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": { "prompt_tokens": 30, "completion_tokens": 12 }
    }))
    .expect("fixture should deserialize");

    let parsed = parse_api_response(response, "gpt-4o");
    assert_eq!(parsed.backend, BackendId::OpenAi);
    assert_eq!(parsed.model, "gpt-4o-2024-08-06");
    assert!(parsed.pending_tool_calls);
    assert_eq!(parsed.usage.total(), 42);

    let invocations = parsed.tool_invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].arguments["query"], "P-12");
}

#[test]
fn stop_finish_reason_is_final() {
    let response: OpenAiApiResponse = serde_json::from_value(json!({
        "choices": [{
            "message": { "content": "Pump P-12 is due next week." },
            "finish_reason": "stop"
        }]
    }))
    .expect("fixture should deserialize");

    let parsed = parse_api_response(response, "gpt-4o");
    assert!(!parsed.pending_tool_calls);
    assert_eq!(parsed.model, "gpt-4o");
    assert_eq!(parsed.final_text(), Some("Pump P-12 is due next week."));
}

#[test]
fn tool_calls_without_finish_reason_still_pend() {
    // Some compatible gateways omit finish_reason but still emit calls.
    let response: OpenAiApiResponse = serde_json::from_value(json!({
        "choices": [{
            "message": {
                "tool_calls": [{
                    "id": "call_9",
                    "type": "function",
                    "function": { "name": "list_open_work_orders", "arguments": "{}" }
                }]
            }
        }]
    }))
    .expect("fixture should deserialize");

    let parsed = parse_api_response(response, "local-llama");
    assert!(parsed.pending_tool_calls);
    assert_eq!(parsed.tool_invocations()[0].name, "list_open_work_orders");
}
