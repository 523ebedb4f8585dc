//! Registry-backed executor for decoded tool invocations.

use std::sync::Arc;

use mwprovider::ToolInvocation;
use serde_json::Value;

use crate::{ToolContext, ToolError, ToolFuture, ToolRegistry};

/// Resolves an invocation against the registry and runs the tool. Every
/// error carries the tool name and invocation id so the failure can be
/// routed back to the backend against the right call.
#[derive(Clone, Default)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn execute<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
        context: &'a ToolContext,
    ) -> ToolFuture<'a, Result<Value, ToolError>> {
        Box::pin(async move {
            let tool = self.registry.get(&invocation.name).ok_or_else(|| {
                ToolError::not_found(format!("tool '{}' is not registered", invocation.name))
                    .with_tool_name(invocation.name.clone())
                    .with_invocation_id(invocation.id.clone())
            })?;

            tool.invoke(invocation.arguments.clone(), context)
                .await
                .map_err(|error| {
                    error
                        .with_tool_name(invocation.name.clone())
                        .with_invocation_id(invocation.id.clone())
                })
        })
    }
}
