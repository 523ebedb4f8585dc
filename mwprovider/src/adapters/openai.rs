//! OpenAI Chat Completions adapter.
//!
//! Tool calls arrive as a `tool_calls` array with stringified JSON arguments
//! and an explicit `finish_reason` of `tool_calls`; results go back as
//! `tool`-role messages keyed by `tool_call_id`. The adapter also serves
//! OpenAI-compatible local gateways, which is why it can be declared
//! text-only: image blocks are then dropped with a warning instead of being
//! sent to an endpoint that would reject them.

use std::sync::Arc;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::{classify_status, payload_text, transport_error};
use crate::{
    BackendCredentialStore, BackendError, BackendFuture, BackendId, ChatBackend, ContentBlock,
    ConversationTurn, Role, TokenUsage, ToolSpec, TurnRequest, TurnResponse,
};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct OpenAiBackend {
    credentials: Arc<BackendCredentialStore>,
    http: Client,
    base_url: String,
    fallback_model: String,
    multimodal: bool,
}

impl OpenAiBackend {
    pub fn new(credentials: Arc<BackendCredentialStore>, http: Client) -> Self {
        Self {
            credentials,
            http,
            base_url: OPENAI_BASE_URL.to_string(),
            fallback_model: "gpt-4o-mini".to_string(),
            multimodal: true,
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

    /// Declares the endpoint non-multimodal; image blocks are dropped with a
    /// warning instead of encoded.
    pub fn text_only(mut self) -> Self {
        self.multimodal = false;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn resolve_api_key(&self) -> Result<String, BackendError> {
        self.credentials
            .with_api_key(BackendId::OpenAi, |value| value.to_string())?
            .ok_or_else(|| BackendError::authentication("no OpenAI credentials configured"))
    }

    async fn parse_error(response: Response) -> BackendError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("OpenAI request failed with status {status}"));
        classify_status(status, message)
    }
}

impl ChatBackend for OpenAiBackend {
    fn id(&self) -> BackendId {
        BackendId::OpenAi
    }

    fn send<'a>(
        &'a self,
        request: TurnRequest,
    ) -> BackendFuture<'a, Result<TurnResponse, BackendError>> {
        Box::pin(async move {
            request.validate()?;
            let api_key = self.resolve_api_key()?;
            let requested_model = if request.model.trim().is_empty() {
                self.fallback_model.clone()
            } else {
                request.model.clone()
            };
            let api_request = build_api_request(request, &self.fallback_model, self.multimodal);

            let response = self
                .http
                .post(self.endpoint("chat/completions"))
                .bearer_auth(api_key)
                .json(&api_request)
                .send()
                .await
                .map_err(transport_error)?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let parsed: OpenAiApiResponse = response
                .json()
                .await
                .map_err(|err| BackendError::unknown(err.to_string()))?;

            Ok(parse_api_response(parsed, &requested_model))
        })
    }

    fn probe<'a>(&'a self) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            let Ok(api_key) = self.resolve_api_key() else {
                return false;
            };

            self.http
                .get(self.endpoint("models"))
                .bearer_auth(api_key)
                .send()
                .await
                .map(|response| response.status().is_success())
                .unwrap_or(false)
        })
    }
}

impl BackendCredentialStore {
    pub fn set_openai_api_key(&self, api_key: impl Into<String>) -> Result<(), BackendError> {
        let api_key = api_key.into();
        if !api_key.starts_with("sk-") {
            return Err(BackendError::authentication(
                "OpenAI API key must start with 'sk-'",
            ));
        }

        self.set_api_key(BackendId::OpenAi, api_key)
    }
}

/// Translates a [`TurnRequest`] into the Chat Completions wire shape. The
/// system prompt becomes the leading `system` message; tool-result blocks
/// fan out into one `tool`-role message each.
pub fn build_api_request(
    request: TurnRequest,
    fallback_model: &str,
    multimodal: bool,
) -> OpenAiApiRequest {
    let model = if request.model.trim().is_empty() {
        fallback_model.to_string()
    } else {
        request.model
    };

    let mut messages = Vec::new();
    if let Some(system_prompt) = request.system_prompt {
        messages.push(OpenAiApiMessage {
            role: "system".to_string(),
            content: Some(OpenAiApiContent::Text(system_prompt)),
            tool_calls: None,
            tool_call_id: None,
        });
    }

    for turn in request.history {
        encode_turn(turn, multimodal, &mut messages);
    }

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(request.tools.into_iter().map(encode_tool).collect())
    };

    OpenAiApiRequest {
        model,
        messages,
        tools,
        temperature: request.temperature,
        max_tokens: request.max_output_tokens,
    }
}

fn encode_turn(turn: ConversationTurn, multimodal: bool, messages: &mut Vec<OpenAiApiMessage>) {
    match turn.role {
        Role::User => encode_user_turn(turn.content, multimodal, messages),
        Role::Assistant => encode_assistant_turn(turn.content, messages),
    }
}

fn encode_user_turn(
    content: Vec<ContentBlock>,
    multimodal: bool,
    messages: &mut Vec<OpenAiApiMessage>,
) {
    let mut parts = Vec::new();

    for block in content {
        match block {
            ContentBlock::Text { text } => parts.push(OpenAiApiPart::Text { text }),
            ContentBlock::Image {
                mime_type,
                base64_data,
            } => {
                if !multimodal {
                    tracing::warn!(
                        backend = %BackendId::OpenAi,
                        "dropping image block for text-only endpoint"
                    );
                    continue;
                }

                parts.push(OpenAiApiPart::ImageUrl {
                    image_url: OpenAiApiImageUrl {
                        url: format!("data:{mime_type};base64,{base64_data}"),
                    },
                });
            }
            ContentBlock::ToolResult {
                id,
                payload,
                is_error,
                ..
            } => {
                // Tool messages have no error flag; failed results are
                // marked by wrapping the payload in an error envelope.
                let content = if is_error {
                    serde_json::json!({ "error": payload }).to_string()
                } else {
                    payload_text(payload)
                };

                messages.push(OpenAiApiMessage {
                    role: "tool".to_string(),
                    content: Some(OpenAiApiContent::Text(content)),
                    tool_calls: None,
                    tool_call_id: Some(id),
                });
            }
            ContentBlock::ToolUse { .. } => {
                tracing::warn!(
                    backend = %BackendId::OpenAi,
                    "dropping tool-use block inside user turn"
                );
            }
        }
    }

    if parts.is_empty() {
        return;
    }

    let content = match parts.as_slice() {
        [OpenAiApiPart::Text { text }] => OpenAiApiContent::Text(text.clone()),
        _ => OpenAiApiContent::Parts(parts),
    };

    messages.push(OpenAiApiMessage {
        role: "user".to_string(),
        content: Some(content),
        tool_calls: None,
        tool_call_id: None,
    });
}

fn encode_assistant_turn(content: Vec<ContentBlock>, messages: &mut Vec<OpenAiApiMessage>) {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in content {
        match block {
            ContentBlock::Text { text: segment } => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&segment);
            }
            ContentBlock::ToolUse {
                id,
                name,
                arguments,
            } => tool_calls.push(OpenAiApiToolCall {
                id,
                call_type: "function".to_string(),
                function: OpenAiApiFunctionCall {
                    name,
                    arguments: arguments.to_string(),
                },
            }),
            ContentBlock::Image { .. } => {
                tracing::warn!(
                    backend = %BackendId::OpenAi,
                    "dropping image block outside user turn"
                );
            }
            ContentBlock::ToolResult { .. } => {
                tracing::warn!(
                    backend = %BackendId::OpenAi,
                    "dropping tool-result block inside assistant turn"
                );
            }
        }
    }

    if text.is_empty() && tool_calls.is_empty() {
        return;
    }

    messages.push(OpenAiApiMessage {
        role: "assistant".to_string(),
        content: if text.is_empty() {
            None
        } else {
            Some(OpenAiApiContent::Text(text))
        },
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        tool_call_id: None,
    });
}

fn encode_tool(spec: ToolSpec) -> OpenAiApiTool {
    OpenAiApiTool {
        tool_type: "function".to_string(),
        function: OpenAiApiFunction {
            name: spec.name,
            description: spec.description,
            parameters: spec.parameters,
        },
    }
}

/// Maps a Chat Completions response back to the shared model. Pending tool
/// calls are signaled by `finish_reason == "tool_calls"`, with the presence
/// of decoded calls as a fallback for lax compatible endpoints.
pub fn parse_api_response(response: OpenAiApiResponse, requested_model: &str) -> TurnResponse {
    let model = response
        .model
        .filter(|model| !model.is_empty())
        .unwrap_or_else(|| requested_model.to_string());

    let usage = response
        .usage
        .map(|usage| TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
        .unwrap_or_default();

    let Some(choice) = response.choices.into_iter().next() else {
        return TurnResponse {
            backend: BackendId::OpenAi,
            model,
            content: Vec::new(),
            pending_tool_calls: false,
            usage,
        };
    };

    let mut content = Vec::new();
    if let Some(text) = choice.message.content
        && !text.is_empty()
    {
        content.push(ContentBlock::Text { text });
    }

    let has_tool_calls = !choice.message.tool_calls.is_empty();
    for call in choice.message.tool_calls {
        content.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            arguments: parse_arguments(call.function.arguments),
        });
    }

    let pending_tool_calls =
        choice.finish_reason.as_deref() == Some("tool_calls") || has_tool_calls;

    TurnResponse {
        backend: BackendId::OpenAi,
        model,
        content,
        pending_tool_calls,
        usage,
    }
}

fn parse_arguments(raw: String) -> Value {
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<OpenAiApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

#[derive(Debug, Serialize)]
pub struct OpenAiApiRequest {
    pub model: String,
    pub messages: Vec<OpenAiApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiApiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct OpenAiApiMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<OpenAiApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OpenAiApiContent {
    Text(String),
    Parts(Vec<OpenAiApiPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAiApiPart {
    Text { text: String },
    ImageUrl { image_url: OpenAiApiImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenAiApiImageUrl {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiApiToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: OpenAiApiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiApiFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Serialize)]
pub struct OpenAiApiTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: OpenAiApiFunction,
}

#[derive(Debug, Serialize)]
pub struct OpenAiApiFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiApiResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<OpenAiApiChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiApiUsage>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiApiChoice {
    pub message: OpenAiApiResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiApiResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<OpenAiApiToolCall>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiApiErrorEnvelope {
    error: OpenAiApiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiApiError {
    message: String,
}
