//! Small convenience constructors for common types.

use std::sync::Arc;

use crate::{
    AgentLoopBuilder, BackendId, ChatBackend, ContentBlock, ConversationTurn, ToolDispatcher,
    ToolRegistry,
};
use mwagent::AgentLoop;

pub fn user_turn(content: impl Into<String>) -> ConversationTurn {
    ConversationTurn::user(content)
}

pub fn assistant_turn(content: impl Into<String>) -> ConversationTurn {
    ConversationTurn::assistant(vec![ContentBlock::text(content)])
}

pub fn image_turn(mime_type: impl Into<String>, base64_data: impl Into<String>) -> ConversationTurn {
    ConversationTurn::user_blocks(vec![ContentBlock::image(mime_type, base64_data)])
}

/// Wires a backend and a tool registry into a loop builder.
pub fn agent(backend: Arc<dyn ChatBackend>, registry: Arc<ToolRegistry>) -> AgentLoopBuilder {
    AgentLoop::builder(backend, ToolDispatcher::new(registry))
}

pub fn parse_backend_id(value: &str) -> Option<BackendId> {
    match value.trim().to_ascii_lowercase().as_str() {
        "anthropic" | "claude" => Some(BackendId::Anthropic),
        "openai" | "gpt" => Some(BackendId::OpenAi),
        "gemini" | "google" => Some(BackendId::Gemini),
        _ => None,
    }
}
