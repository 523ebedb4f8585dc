//! The agentic loop: repeated backend rounds interleaved with tool dispatch.

use std::sync::Arc;
use std::time::Instant;

use mwprovider::{
    ChatBackend, ContentBlock, ConversationTurn, ToolSpec, TurnRequest, TurnResponse,
};
use mwtooling::{ToolContext, ToolDispatcher};
use serde_json::Value;

use crate::{
    AgentError, ChatTurnRequest, LoopHooks, LoopOutcome, NO_ANSWER_PLACEHOLDER, NoopLoopHooks,
};

/// Shared across all backends; caps latency and cost per invocation.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 10;

/// One user turn in, one final answer out, with as many tool rounds in
/// between as the backend asks for, bounded by `max_tool_rounds`. The
/// initial send is round 0 and does not count against the budget.
pub struct AgentLoop {
    backend: Arc<dyn ChatBackend>,
    dispatcher: ToolDispatcher,
    hooks: Arc<dyn LoopHooks>,
    model: String,
    max_tool_rounds: u32,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl std::fmt::Debug for AgentLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentLoop")
            .field("model", &self.model)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish_non_exhaustive()
    }
}

impl AgentLoop {
    pub fn builder(backend: Arc<dyn ChatBackend>, dispatcher: ToolDispatcher) -> AgentLoopBuilder {
        AgentLoopBuilder {
            backend,
            dispatcher,
            hooks: Arc::new(NoopLoopHooks),
            model: String::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub async fn run(&self, request: ChatTurnRequest) -> Result<LoopOutcome, AgentError> {
        let mut rounds = 0u32;
        match self.drive(request, &mut rounds).await {
            Ok(outcome) => {
                self.hooks.on_loop_complete(&outcome, rounds);
                Ok(outcome)
            }
            Err(error) => {
                self.hooks.on_loop_failure(&error, rounds);
                Err(error)
            }
        }
    }

    async fn drive(
        &self,
        request: ChatTurnRequest,
        rounds: &mut u32,
    ) -> Result<LoopOutcome, AgentError> {
        let ChatTurnRequest {
            system_prompt,
            tools,
            mut history,
            context,
        } = request;
        let mut tools_used = Vec::new();

        let mut response = self.send_round(&system_prompt, &tools, &history, 0).await?;

        while response.pending_tool_calls {
            if *rounds >= self.max_tool_rounds {
                return Err(AgentError::tool_round_limit(format!(
                    "backend still requested tools after {} tool rounds",
                    self.max_tool_rounds
                )));
            }

            let invocations = response.tool_invocations();
            // The backend is stateless; it must see its own tool-call
            // request in the history on the next round.
            history.push(ConversationTurn::assistant(response.content));

            if invocations.is_empty() {
                // Pending was reported but nothing decoded. Re-send once
                // more, still counted against the budget, instead of
                // stalling forever.
                tracing::warn!(
                    backend = %self.backend.id(),
                    round = *rounds,
                    "pending tool calls reported but none decoded"
                );
            } else {
                let mut results = Vec::with_capacity(invocations.len());
                for invocation in &invocations {
                    self.hooks.on_tool_dispatch(invocation, &context);
                    let started = Instant::now();
                    let result = self.dispatcher.execute(invocation, &context).await;
                    self.hooks
                        .on_tool_result(invocation, &result, started.elapsed());
                    tools_used.push(invocation.name.clone());

                    let block = match result {
                        Ok(payload) => ContentBlock::tool_result(
                            invocation.id.as_str(),
                            invocation.name.as_str(),
                            payload,
                            false,
                        ),
                        Err(error) => ContentBlock::tool_result(
                            invocation.id.as_str(),
                            invocation.name.as_str(),
                            Value::String(error.to_string()),
                            true,
                        ),
                    };
                    results.push(block);
                }

                history.push(ConversationTurn::tool_results(results));
            }

            *rounds += 1;
            response = self
                .send_round(&system_prompt, &tools, &history, *rounds)
                .await?;
        }

        let final_text = response
            .final_text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(ToString::to_string)
            .unwrap_or_else(|| NO_ANSWER_PLACEHOLDER.to_string());

        Ok(LoopOutcome {
            final_text,
            tools_used,
            usage: response.usage,
        })
    }

    async fn send_round(
        &self,
        system_prompt: &Option<String>,
        tools: &[ToolSpec],
        history: &[ConversationTurn],
        round: u32,
    ) -> Result<TurnResponse, AgentError> {
        self.hooks.on_round_start(self.backend.id(), round);

        let mut request =
            TurnRequest::new(self.model.as_str(), history.to_vec()).with_tools(tools.to_vec());
        if let Some(system_prompt) = system_prompt {
            request = request.with_system_prompt(system_prompt.as_str());
        }

        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        if let Some(max_output_tokens) = self.max_output_tokens {
            request = request.with_max_output_tokens(max_output_tokens);
        }

        let response = self.backend.send(request).await?;
        self.hooks.on_backend_response(&response, round);
        Ok(response)
    }
}

pub struct AgentLoopBuilder {
    backend: Arc<dyn ChatBackend>,
    dispatcher: ToolDispatcher,
    hooks: Arc<dyn LoopHooks>,
    model: String,
    max_tool_rounds: u32,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl AgentLoopBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn LoopHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn max_tool_rounds(mut self, max_tool_rounds: u32) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn build(self) -> Result<AgentLoop, AgentError> {
        if self.model.trim().is_empty() {
            return Err(AgentError::invalid_request("model must not be empty"));
        }

        if self.max_tool_rounds == 0 {
            return Err(AgentError::invalid_request(
                "max_tool_rounds must be at least 1",
            ));
        }

        Ok(AgentLoop {
            backend: self.backend,
            dispatcher: self.dispatcher,
            hooks: self.hooks,
            model: self.model,
            max_tool_rounds: self.max_tool_rounds,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        })
    }
}
