//! Tool trait contract for registry-managed capabilities.
//!
//! ```rust
//! use mwprovider::ToolSpec;
//! use mwtooling::{FunctionTool, Tool};
//! use serde_json::json;
//!
//! let tool = FunctionTool::new(
//!     ToolSpec::new("echo", "Echoes input", json!({"type": "object"})),
//!     |args, _ctx| async move { Ok(args) },
//! );
//!
//! assert_eq!(tool.spec().name, "echo");
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use mwprovider::ToolSpec;
use serde_json::Value;

use crate::{ToolContext, ToolError};

pub type ToolFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One callable capability. Arguments arrive as the decoded JSON the backend
/// produced; the payload returned here is re-encoded into a tool-result block
/// untouched.
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    fn invoke<'a>(
        &'a self,
        arguments: Value,
        context: &'a ToolContext,
    ) -> ToolFuture<'a, Result<Value, ToolError>>;
}

type ToolHandler =
    dyn Fn(Value, ToolContext) -> ToolFuture<'static, Result<Value, ToolError>> + Send + Sync;

pub struct FunctionTool {
    spec: ToolSpec,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(spec: ToolSpec, handler: F) -> Self
    where
        F: Fn(Value, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        let handler: Arc<ToolHandler> =
            Arc::new(move |arguments, context| Box::pin(handler(arguments, context)));

        Self { spec, handler }
    }
}

impl Tool for FunctionTool {
    fn spec(&self) -> ToolSpec {
        self.spec.clone()
    }

    fn invoke<'a>(
        &'a self,
        arguments: Value,
        context: &'a ToolContext,
    ) -> ToolFuture<'a, Result<Value, ToolError>> {
        let context = context.clone();
        (self.handler)(arguments, context)
    }
}
