//! Backend-agnostic conversation, tool, and turn model types.
//!
//! ```rust
//! use mwprovider::{BackendErrorKind, ConversationTurn, TurnRequest};
//!
//! let ok = TurnRequest::new_validated(
//!     "claude-sonnet-4-5",
//!     vec![ConversationTurn::user("Is pump P-12 due for service?")],
//! );
//! assert!(ok.is_ok());
//!
//! let err = TurnRequest::new_validated("", vec![ConversationTurn::user("hi")])
//!     .err()
//!     .expect("empty model should fail");
//! assert_eq!(err.kind, BackendErrorKind::InvalidRequest);
//! ```

use std::fmt::{Display, Formatter};

use serde_json::Value;

use crate::{BackendError, BackendErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendId {
    Anthropic,
    OpenAi,
    Gemini,
}

impl Display for BackendId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        };

        f.write_str(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One typed unit inside a conversation turn.
///
/// `ToolUse` is only ever produced inside assistant turns; `ToolResult` is
/// only ever injected inside user turns carrying dispatcher output back to
/// the backend. Image blocks are only valid inside user turns.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        mime_type: String,
        base64_data: String,
    },
    ToolUse {
        id: String,
        name: String,
        arguments: Value,
    },
    ToolResult {
        id: String,
        name: String,
        payload: Value,
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self::Image {
            mime_type: mime_type.into(),
            base64_data: base64_data.into(),
        }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    pub fn tool_result(
        id: impl Into<String>,
        name: impl Into<String>,
        payload: Value,
        is_error: bool,
    ) -> Self {
        Self::ToolResult {
            id: id.into(),
            name: name.into(),
            payload,
            is_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    pub fn user_blocks(content: Vec<ContentBlock>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Dispatcher output rides back to the backend as a user-role turn; each
    /// adapter re-encodes it to the backend's native result convention.
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self::new(Role::User, results)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A decoded request from the backend to run one tool. The `id` correlates
/// the request to its result; backends without wire-level ids get one
/// synthesized by their adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// One request/response cycle against a backend: full history, the static
/// tool set, and the system prompt, every round.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub tools: Vec<ToolSpec>,
    pub history: Vec<ConversationTurn>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl TurnRequest {
    pub fn new(model: impl Into<String>, history: Vec<ConversationTurn>) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            tools: Vec::new(),
            history,
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub fn new_validated(
        model: impl Into<String>,
        history: Vec<ConversationTurn>,
    ) -> Result<Self, BackendError> {
        let request = Self::new(model, history);
        request.validate()?;
        Ok(request)
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn validate(&self) -> Result<(), BackendError> {
        if self.model.trim().is_empty() {
            return Err(BackendError::invalid_request("model must not be empty"));
        }

        if self.history.is_empty() {
            return Err(BackendError::invalid_request(
                "at least one conversation turn is required",
            ));
        }

        if let Some(max_output_tokens) = self.max_output_tokens
            && max_output_tokens == 0
        {
            return Err(BackendError::invalid_request(
                "max_output_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(BackendError::new(
                BackendErrorKind::InvalidRequest,
                "temperature must be in the inclusive range 0.0..=2.0",
                false,
            ));
        }

        Ok(())
    }
}

/// A backend response already normalized to the shared content model.
///
/// `pending_tool_calls` is the single termination predicate the orchestrator
/// reads: each adapter derives it from its own native signal (explicit stop
/// reason or presence of tool-call content).
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResponse {
    pub backend: BackendId,
    pub model: String,
    pub content: Vec<ContentBlock>,
    pub pending_tool_calls: bool,
    pub usage: TokenUsage,
}

impl TurnResponse {
    /// Extracts the tool invocations requested by this response, in the
    /// order the backend emitted them.
    pub fn tool_invocations(&self) -> Vec<ToolInvocation> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse {
                    id,
                    name,
                    arguments,
                } => Some(ToolInvocation {
                    id: id.clone(),
                    name: name.clone(),
                    arguments: arguments.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// The first text segment of the response, if any. Absence is a
    /// recoverable condition the orchestrator substitutes a placeholder for,
    /// never an error.
    pub fn final_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}
