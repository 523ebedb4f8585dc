//! Google Gemini generateContent adapter.
//!
//! Gemini differs from the other backends on every axis that matters here:
//! the assistant role is called `model`, tool calls are `functionCall` parts
//! with no wire-level ids or stop reason (pending work is signaled purely by
//! their presence), results go back as `functionResponse` parts matched by
//! function name, and tool schemas use a restricted OpenAPI dialect instead
//! of raw JSON Schema.

use std::sync::Arc;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::adapters::{classify_status, transport_error};
use crate::{
    BackendCredentialStore, BackendError, BackendFuture, BackendId, ChatBackend, ContentBlock,
    ConversationTurn, Role, TokenUsage, ToolSpec, TurnRequest, TurnResponse,
};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiBackend {
    credentials: Arc<BackendCredentialStore>,
    http: Client,
    base_url: String,
    fallback_model: String,
}

impl GeminiBackend {
    pub fn new(credentials: Arc<BackendCredentialStore>, http: Client) -> Self {
        Self {
            credentials,
            http,
            base_url: GEMINI_BASE_URL.to_string(),
            fallback_model: "gemini-2.0-flash".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn resolve_api_key(&self) -> Result<String, BackendError> {
        self.credentials
            .with_api_key(BackendId::Gemini, |value| value.to_string())?
            .ok_or_else(|| BackendError::authentication("no Gemini credentials configured"))
    }

    async fn parse_error(response: Response) -> BackendError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("Gemini request failed with status {status}"));
        classify_status(status, message)
    }
}

impl ChatBackend for GeminiBackend {
    fn id(&self) -> BackendId {
        BackendId::Gemini
    }

    fn send<'a>(
        &'a self,
        request: TurnRequest,
    ) -> BackendFuture<'a, Result<TurnResponse, BackendError>> {
        Box::pin(async move {
            request.validate()?;
            let api_key = self.resolve_api_key()?;
            let model = if request.model.trim().is_empty() {
                self.fallback_model.clone()
            } else {
                request.model.clone()
            };
            let api_request = build_api_request(request);

            let response = self
                .http
                .post(self.endpoint(&format!("models/{model}:generateContent")))
                .header("x-goog-api-key", api_key)
                .json(&api_request)
                .send()
                .await
                .map_err(transport_error)?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let parsed: GeminiApiResponse = response
                .json()
                .await
                .map_err(|err| BackendError::unknown(err.to_string()))?;

            Ok(parse_api_response(parsed, &model))
        })
    }

    fn probe<'a>(&'a self) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            let Ok(api_key) = self.resolve_api_key() else {
                return false;
            };

            self.http
                .get(self.endpoint("models"))
                .header("x-goog-api-key", api_key)
                .send()
                .await
                .map(|response| response.status().is_success())
                .unwrap_or(false)
        })
    }
}

impl BackendCredentialStore {
    pub fn set_gemini_api_key(&self, api_key: impl Into<String>) -> Result<(), BackendError> {
        let api_key = api_key.into();
        if !api_key.starts_with("AIza") {
            return Err(BackendError::authentication(
                "Gemini API key must start with 'AIza'",
            ));
        }

        self.set_api_key(BackendId::Gemini, api_key)
    }
}

/// Translates a [`TurnRequest`] into the generateContent wire shape.
pub fn build_api_request(request: TurnRequest) -> GeminiApiRequest {
    let system_instruction = request.system_prompt.map(|text| GeminiApiContent {
        role: None,
        parts: vec![GeminiApiPart::text(text)],
    });

    let contents = request
        .history
        .into_iter()
        .filter_map(encode_turn)
        .collect::<Vec<_>>();

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(vec![GeminiApiToolDecl {
            function_declarations: request.tools.into_iter().map(encode_tool).collect(),
        }])
    };

    let generation_config = if request.temperature.is_none() && request.max_output_tokens.is_none()
    {
        None
    } else {
        Some(GeminiApiGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        })
    };

    GeminiApiRequest {
        system_instruction,
        contents,
        tools,
        generation_config,
    }
}

fn encode_turn(turn: ConversationTurn) -> Option<GeminiApiContent> {
    let role = match turn.role {
        Role::User => "user",
        Role::Assistant => "model",
    };

    let parts = turn
        .content
        .into_iter()
        .filter_map(|block| encode_block(block, turn.role))
        .collect::<Vec<_>>();

    if parts.is_empty() {
        return None;
    }

    Some(GeminiApiContent {
        role: Some(role.to_string()),
        parts,
    })
}

fn encode_block(block: ContentBlock, role: Role) -> Option<GeminiApiPart> {
    match block {
        ContentBlock::Text { text } => Some(GeminiApiPart::text(text)),
        ContentBlock::Image {
            mime_type,
            base64_data,
        } => {
            if role != Role::User {
                tracing::warn!(
                    backend = %BackendId::Gemini,
                    "dropping image block outside user turn"
                );
                return None;
            }

            Some(GeminiApiPart {
                inline_data: Some(GeminiApiInlineData {
                    mime_type,
                    data: base64_data,
                }),
                ..GeminiApiPart::default()
            })
        }
        ContentBlock::ToolUse {
            name, arguments, ..
        } => Some(GeminiApiPart {
            function_call: Some(GeminiApiFunctionCall {
                name,
                args: arguments,
            }),
            ..GeminiApiPart::default()
        }),
        ContentBlock::ToolResult {
            name,
            payload,
            is_error,
            ..
        } => Some(GeminiApiPart {
            function_response: Some(GeminiApiFunctionResponse {
                name,
                response: response_value(payload, is_error),
            }),
            ..GeminiApiPart::default()
        }),
    }
}

/// `functionResponse.response` must be a JSON object; scalar payloads are
/// wrapped and failed results are marked with an error envelope.
fn response_value(payload: Value, is_error: bool) -> Value {
    if is_error {
        return json!({ "error": payload });
    }

    match payload {
        Value::Object(map) => Value::Object(map),
        other => json!({ "result": other }),
    }
}

fn encode_tool(spec: ToolSpec) -> GeminiApiFunctionDecl {
    GeminiApiFunctionDecl {
        name: spec.name,
        description: spec.description,
        parameters: sanitize_schema(&spec.parameters),
    }
}

/// Rewrites a JSON-Schema-like value into Gemini's restricted schema dialect.
///
/// Known scalar and container types map onto the uppercased Gemini type
/// enum; `properties`, `items`, `enum`, `required`, and `description` are
/// preserved recursively; everything else is stripped. Unknown or missing
/// node types fall back to the permissive `STRING` type rather than failing.
pub fn sanitize_schema(schema: &Value) -> Value {
    let Value::Object(node) = schema else {
        return json!({ "type": "STRING" });
    };

    let declared = node.get("type").and_then(Value::as_str);
    let mapped = match declared {
        Some("string") => "STRING",
        Some("number") => "NUMBER",
        Some("integer") => "INTEGER",
        Some("boolean") => "BOOLEAN",
        Some("array") => "ARRAY",
        Some("object") => "OBJECT",
        _ if node.contains_key("properties") => "OBJECT",
        _ if node.contains_key("items") => "ARRAY",
        _ => "STRING",
    };

    let mut out = Map::new();
    out.insert("type".to_string(), json!(mapped));

    if let Some(description) = node.get("description").and_then(Value::as_str) {
        out.insert("description".to_string(), json!(description));
    }

    if let Some(values @ Value::Array(_)) = node.get("enum") {
        out.insert("enum".to_string(), values.clone());
    }

    if mapped == "OBJECT" {
        if let Some(Value::Object(properties)) = node.get("properties") {
            let sanitized = properties
                .iter()
                .map(|(key, value)| (key.clone(), sanitize_schema(value)))
                .collect::<Map<_, _>>();
            out.insert("properties".to_string(), Value::Object(sanitized));
        }

        if let Some(required @ Value::Array(_)) = node.get("required") {
            out.insert("required".to_string(), required.clone());
        }
    }

    if mapped == "ARRAY" {
        let items = node.get("items").map_or_else(
            || json!({ "type": "STRING" }),
            sanitize_schema,
        );
        out.insert("items".to_string(), items);
    }

    Value::Object(out)
}

/// Maps a generateContent response back to the shared model. Gemini carries
/// no wire-level invocation ids, so each `functionCall` part gets one
/// synthesized from its name and position; pending work is signaled by the
/// presence of any such part.
pub fn parse_api_response(response: GeminiApiResponse, model: &str) -> TurnResponse {
    let usage = response
        .usage_metadata
        .map(|usage| TokenUsage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        })
        .unwrap_or_default();

    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    let mut content = Vec::new();
    let mut call_index = 0usize;

    for part in parts {
        if let Some(text) = part.text {
            content.push(ContentBlock::Text { text });
        }

        if let Some(call) = part.function_call {
            content.push(ContentBlock::ToolUse {
                id: format!("{}-{call_index}", call.name),
                name: call.name,
                arguments: call.args,
            });
            call_index += 1;
        }
    }

    TurnResponse {
        backend: BackendId::Gemini,
        model: model.to_string(),
        pending_tool_calls: call_index > 0,
        content,
        usage,
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<GeminiApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

#[derive(Debug, Serialize)]
pub struct GeminiApiRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiApiContent>,
    pub contents: Vec<GeminiApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<GeminiApiToolDecl>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiApiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiApiPart>,
}

/// One wire part; exactly one field is set at a time.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeminiApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        rename = "inlineData",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<GeminiApiInlineData>,
    #[serde(
        default,
        rename = "functionCall",
        skip_serializing_if = "Option::is_none"
    )]
    pub function_call: Option<GeminiApiFunctionCall>,
    #[serde(
        default,
        rename = "functionResponse",
        skip_serializing_if = "Option::is_none"
    )]
    pub function_response: Option<GeminiApiFunctionResponse>,
}

impl GeminiApiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiApiInlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiApiFunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiApiFunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Serialize)]
pub struct GeminiApiToolDecl {
    #[serde(rename = "functionDeclarations")]
    pub function_declarations: Vec<GeminiApiFunctionDecl>,
}

#[derive(Debug, Serialize)]
pub struct GeminiApiFunctionDecl {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
pub struct GeminiApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiApiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiApiCandidate>,
    #[serde(default, rename = "usageMetadata")]
    pub usage_metadata: Option<GeminiApiUsage>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiApiCandidate {
    #[serde(default)]
    pub content: Option<GeminiApiContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiUsage {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiApiErrorEnvelope {
    error: GeminiApiError,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
}
