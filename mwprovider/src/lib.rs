//! Backend adapters and the shared conversation model for millwright.
//!
//! Every backend is normalized to one conversation/tool contract: callers
//! build [`TurnRequest`]s out of [`ConversationTurn`]s, and every adapter
//! answers with a [`TurnResponse`] carrying shared [`ContentBlock`]s and a
//! single `pending_tool_calls` termination predicate.

mod backend;
mod credentials;
mod error;
mod model;

pub mod adapters;

pub use backend::{BackendFuture, BackendRegistry, ChatBackend};
pub use credentials::{BackendCredentialStore, SecretString};
pub use error::{BackendError, BackendErrorKind};
pub use model::{
    BackendId, ContentBlock, ConversationTurn, Role, TokenUsage, ToolInvocation, ToolSpec,
    TurnRequest, TurnResponse,
};

pub mod prelude {
    //! Common `mwprovider` imports for downstream crates.

    pub use crate::{
        BackendCredentialStore, BackendError, BackendErrorKind, BackendFuture, BackendId,
        BackendRegistry, ChatBackend, ContentBlock, ConversationTurn, Role, SecretString,
        TokenUsage, ToolInvocation, ToolSpec, TurnRequest, TurnResponse,
    };
}
