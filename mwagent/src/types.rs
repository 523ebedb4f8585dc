//! Request and outcome types for one agentic chat invocation.

use mwprovider::{ContentBlock, ConversationTurn, TokenUsage, ToolSpec};
use mwtooling::ToolContext;

/// Substituted when the final backend response carries no usable text, so
/// downstream consumers never see an empty answer.
pub const NO_ANSWER_PLACEHOLDER: &str = "The assistant did not produce a final answer.";

/// One user turn plus everything the loop needs to run it: the advertised
/// tool set, prior history, and the execution context handed to tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurnRequest {
    pub system_prompt: Option<String>,
    pub tools: Vec<ToolSpec>,
    pub history: Vec<ConversationTurn>,
    pub context: ToolContext,
}

impl ChatTurnRequest {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self::with_history(vec![ConversationTurn::user(user_input)])
    }

    pub fn with_history(history: Vec<ConversationTurn>) -> Self {
        Self {
            system_prompt: None,
            tools: Vec::new(),
            history,
            context: ToolContext::default(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_context(mut self, context: ToolContext) -> Self {
        self.context = context;
        self
    }

    /// Appends another user turn, e.g. one carrying image blocks.
    pub fn push_user_blocks(mut self, blocks: Vec<ContentBlock>) -> Self {
        self.history.push(ConversationTurn::user_blocks(blocks));
        self
    }
}

/// The final answer plus the audit trail of one loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub final_text: String,
    /// Every dispatched tool name in call order, failures included.
    pub tools_used: Vec<String>,
    /// Usage reported by the final backend response, zero-filled when the
    /// backend omits counters.
    pub usage: TokenUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wraps_user_input_in_a_single_turn() {
        let request = ChatTurnRequest::new("find pump P-12");
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.history[0], ConversationTurn::user("find pump P-12"));
        assert!(request.system_prompt.is_none());
        assert!(request.tools.is_empty());
    }

    #[test]
    fn push_user_blocks_appends_a_turn() {
        let request = ChatTurnRequest::new("what is this?")
            .push_user_blocks(vec![ContentBlock::image("image/png", "aGVsbG8=")]);
        assert_eq!(request.history.len(), 2);
    }
}
