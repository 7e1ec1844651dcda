//! Bringing services up and running workflows against them.
//!
//! - `collaborator` - the [`ContainerOrchestrator`] trait
//! - `docker` / `attached` - its two implementations
//! - `runner` - [`TopologyRunner`]: start, wait, look up, tear down
//! - `readiness` - concurrent TCP probing
//! - `workflow` - spawning the workflow command

mod attached;
mod collaborator;
mod docker;
mod readiness;
mod runner;
mod workflow;

pub use attached::AttachedOrchestrator;
pub use collaborator::{ContainerOrchestrator, OrchestratorError};
pub use docker::DockerOrchestrator;
pub use runner::{RunningService, TopologyRunner};
pub use workflow::{exit_code, WorkflowReport};
