//! Production-friendly observability hooks for the agent loop.
//!
//! ```rust
//! use mwobserve::{MetricsLoopHooks, SafeLoopHooks, TracingLoopHooks};
//!
//! let _hooks = SafeLoopHooks::new(TracingLoopHooks);
//! let _metrics = MetricsLoopHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsLoopHooks;
pub use safe_hooks::SafeLoopHooks;
pub use tracing_hooks::TracingLoopHooks;

pub mod prelude {
    pub use crate::{MetricsLoopHooks, SafeLoopHooks, TracingLoopHooks};
}

#[cfg(test)]
mod tests;
