//! Anthropic Messages API adapter.
//!
//! Anthropic is the one backend whose wire shape is closest to the shared
//! model: role-tagged messages carrying typed content blocks, tool results
//! re-injected as user-role `tool_result` blocks, and an explicit
//! `stop_reason` of `tool_use` when invocations are pending.

use std::sync::Arc;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::{classify_status, payload_text, transport_error};
use crate::{
    BackendCredentialStore, BackendError, BackendFuture, BackendId, ChatBackend, ContentBlock,
    ConversationTurn, Role, TokenUsage, ToolSpec, TurnRequest, TurnResponse,
};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic requires `max_tokens` on every request; used when the caller
/// does not set one.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;

#[derive(Clone)]
pub struct AnthropicBackend {
    credentials: Arc<BackendCredentialStore>,
    http: Client,
    base_url: String,
    fallback_model: String,
}

impl AnthropicBackend {
    pub fn new(credentials: Arc<BackendCredentialStore>, http: Client) -> Self {
        Self {
            credentials,
            http,
            base_url: ANTHROPIC_BASE_URL.to_string(),
            fallback_model: "claude-sonnet-4-5".to_string(),
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
            .with_api_key(BackendId::Anthropic, |value| value.to_string())?
            .ok_or_else(|| BackendError::authentication("no Anthropic credentials configured"))
    }

    async fn parse_error(response: Response) -> BackendError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("Anthropic request failed with status {status}"));
        classify_status(status, message)
    }
}

impl ChatBackend for AnthropicBackend {
    fn id(&self) -> BackendId {
        BackendId::Anthropic
    }

    fn send<'a>(
        &'a self,
        request: TurnRequest,
    ) -> BackendFuture<'a, Result<TurnResponse, BackendError>> {
        Box::pin(async move {
            request.validate()?;
            let api_key = self.resolve_api_key()?;
            let api_request = build_api_request(request, &self.fallback_model);

            let response = self
                .http
                .post(self.endpoint("messages"))
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&api_request)
                .send()
                .await
                .map_err(transport_error)?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let parsed: AnthropicApiResponse = response
                .json()
                .await
                .map_err(|err| BackendError::unknown(err.to_string()))?;

            Ok(parse_api_response(parsed))
        })
    }

    fn probe<'a>(&'a self) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            let Ok(api_key) = self.resolve_api_key() else {
                return false;
            };

            self.http
                .get(self.endpoint("models"))
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .send()
                .await
                .map(|response| response.status().is_success())
                .unwrap_or(false)
        })
    }
}

impl BackendCredentialStore {
    pub fn set_anthropic_api_key(&self, api_key: impl Into<String>) -> Result<(), BackendError> {
        let api_key = api_key.into();
        if !api_key.starts_with("sk-ant-") {
            return Err(BackendError::authentication(
                "Anthropic API key must start with 'sk-ant-'",
            ));
        }

        self.set_api_key(BackendId::Anthropic, api_key)
    }
}

/// Translates a [`TurnRequest`] into the Messages API wire shape. Image
/// blocks outside user turns are dropped with a warning; turns left with no
/// encodable content are skipped entirely (the API rejects empty content
/// arrays).
pub fn build_api_request(request: TurnRequest, fallback_model: &str) -> AnthropicApiRequest {
    let model = if request.model.trim().is_empty() {
        fallback_model.to_string()
    } else {
        request.model
    };

    let messages = request
        .history
        .into_iter()
        .filter_map(encode_turn)
        .collect::<Vec<_>>();

    let tools = request.tools.into_iter().map(encode_tool).collect();

    AnthropicApiRequest {
        model,
        max_tokens: request
            .max_output_tokens
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        system: request.system_prompt,
        messages,
        tools,
        temperature: request.temperature,
    }
}

fn encode_turn(turn: ConversationTurn) -> Option<AnthropicApiMessage> {
    let role = match turn.role {
        Role::User => "user",
        Role::Assistant => "assistant",
    };

    let content = turn
        .content
        .into_iter()
        .filter_map(|block| encode_block(block, turn.role))
        .collect::<Vec<_>>();

    if content.is_empty() {
        return None;
    }

    Some(AnthropicApiMessage {
        role: role.to_string(),
        content,
    })
}

fn encode_block(block: ContentBlock, role: Role) -> Option<AnthropicApiBlock> {
    match block {
        ContentBlock::Text { text } => Some(AnthropicApiBlock::Text { text }),
        ContentBlock::Image {
            mime_type,
            base64_data,
        } => {
            if role != Role::User {
                tracing::warn!(
                    backend = %BackendId::Anthropic,
                    "dropping image block outside user turn"
                );
                return None;
            }

            Some(AnthropicApiBlock::Image {
                source: AnthropicApiImageSource {
                    source_type: "base64".to_string(),
                    media_type: mime_type,
                    data: base64_data,
                },
            })
        }
        ContentBlock::ToolUse {
            id,
            name,
            arguments,
        } => Some(AnthropicApiBlock::ToolUse {
            id,
            name,
            input: arguments,
        }),
        ContentBlock::ToolResult {
            id,
            payload,
            is_error,
            ..
        } => Some(AnthropicApiBlock::ToolResult {
            tool_use_id: id,
            content: payload_text(payload),
            is_error,
        }),
    }
}

fn encode_tool(spec: ToolSpec) -> AnthropicApiTool {
    AnthropicApiTool {
        name: spec.name,
        description: spec.description,
        input_schema: spec.parameters,
    }
}

/// Maps a Messages API response back to the shared model. Pending tool calls
/// are signaled explicitly by `stop_reason == "tool_use"`.
pub fn parse_api_response(response: AnthropicApiResponse) -> TurnResponse {
    let pending_tool_calls = response.stop_reason.as_deref() == Some("tool_use");

    let content = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicApiBlock::Text { text } => Some(ContentBlock::Text { text }),
            AnthropicApiBlock::ToolUse { id, name, input } => Some(ContentBlock::ToolUse {
                id,
                name,
                arguments: input,
            }),
            _ => None,
        })
        .collect();

    TurnResponse {
        backend: BackendId::Anthropic,
        model: response.model,
        content,
        pending_tool_calls,
        usage: TokenUsage {
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        },
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<AnthropicApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

#[derive(Debug, Serialize)]
pub struct AnthropicApiRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AnthropicApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<AnthropicApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicApiMessage {
    pub role: String,
    pub content: Vec<AnthropicApiBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicApiBlock {
    Text {
        text: String,
    },
    Image {
        source: AnthropicApiImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnthropicApiImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct AnthropicApiTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicApiResponse {
    pub model: String,
    #[serde(default)]
    pub content: Vec<AnthropicApiBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: AnthropicApiUsage,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnthropicApiUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicApiErrorEnvelope {
    error: AnthropicApiError,
}

#[derive(Debug, Deserialize)]
struct AnthropicApiError {
    message: String,
}
