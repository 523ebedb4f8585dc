//! Capability layer for registering and executing tools.

mod args;
mod context;
mod dispatcher;
mod error;
mod registry;
mod tool;

pub mod prelude {
    pub use crate::{
        FunctionTool, Tool, ToolContext, ToolDispatcher, ToolError, ToolErrorKind, ToolFuture,
        ToolRegistry,
    };
}

pub use args::{optional_u64, require_object, required_string};
pub use context::ToolContext;
pub use dispatcher::ToolDispatcher;
pub use error::{ToolError, ToolErrorKind};
pub use registry::ToolRegistry;
pub use tool::{FunctionTool, Tool, ToolFuture};
