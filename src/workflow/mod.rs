//! Workflow planning and the pieces the executor needs.
//!
//! - `plan` - turn a workflow config into a [`WorkflowInvocation`] (pure)
//! - `template` - `{{port:NAME}}` / `{{host:NAME}}` placeholders
//! - `env` - environment overlay
//! - `state` - per-invocation state machine
//!
//! Execution lives with the runner in [`crate::orchestrator`].

mod env;
mod plan;
mod state;
mod template;

pub use env::*;
pub use plan::*;
pub use state::*;
pub use template::*;
