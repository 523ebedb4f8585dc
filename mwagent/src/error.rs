//! Loop-level errors surfaced to the caller.

use std::error::Error;
use std::fmt::{Display, Formatter};

use mwprovider::{BackendError, BackendErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentErrorKind {
    Authentication,
    RateLimited,
    Unavailable,
    InvalidRequest,
    Timeout,
    /// An unclassified backend failure.
    Backend,
    /// The tool-round budget ran out while the backend still wanted tools.
    /// Indicates runaway tool usage rather than infrastructure failure.
    ToolRoundLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentError {
    pub kind: AgentErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl AgentError {
    pub fn new(kind: AgentErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::InvalidRequest, message, false)
    }

    pub fn tool_round_limit(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::ToolRoundLimit, message, false)
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl Display for AgentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for AgentError {}

impl From<BackendError> for AgentError {
    fn from(error: BackendError) -> Self {
        let kind = match error.kind {
            BackendErrorKind::Authentication => AgentErrorKind::Authentication,
            BackendErrorKind::RateLimited => AgentErrorKind::RateLimited,
            BackendErrorKind::Unavailable => AgentErrorKind::Unavailable,
            BackendErrorKind::InvalidRequest => AgentErrorKind::InvalidRequest,
            BackendErrorKind::Timeout => AgentErrorKind::Timeout,
            BackendErrorKind::Unknown => AgentErrorKind::Backend,
        };

        Self::new(kind, error.message, error.retryable)
    }
}
