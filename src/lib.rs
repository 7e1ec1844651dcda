//! # Service Topology
//!
//! Bring up a declared set of auxiliary services, wait until each accepts TCP
//! connections, then run a command with environment variables pointing at
//! them. Built for CI jobs that need Kafka, a schema registry or Postgres
//! next to the test suite.
//!
//! ## Quick Start
//!
//! ```no_run
//! use service_topology::orchestrator::{DockerOrchestrator, TopologyRunner};
//! use service_topology::workflow::plan_workflow;
//! use service_topology::{Parser, Topology, TopologyOptions};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Parser::new().load_config("topology.yaml")?;
//! let topology = Arc::new(Topology::from_config(&config, TopologyOptions::default())?);
//! let plan = plan_workflow(&config, &topology, "default", std::path::Path::new("."))?;
//!
//! let runner = TopologyRunner::new(topology, Arc::new(DockerOrchestrator::new("ci")))
//!     .with_readiness(config.readiness.settings()?);
//! let result = runner.run_workflow(&plan).await;
//! runner.teardown().await;
//! result?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! - [`config`]: `topology.yaml` parsing, presets, validation
//! - [`topology`]: the resolved, immutable service list
//! - [`workflow`]: pure planning, templates, env overlay, state machine
//! - [`orchestrator`]: the collaborator trait and the runner
//! - [`healthcheck`]: TCP readiness probes
//! - [`docker`]: `docker` CLI wrapper

pub mod config;
pub mod docker;
pub mod error;
pub mod healthcheck;
pub mod orchestrator;
pub mod topology;
pub mod workflow;

pub use config::{Config, Parser, ReadinessSettings};
pub use error::{Error, LookupError, Result, StartupError, WorkflowError};
pub use orchestrator::{ContainerOrchestrator, TopologyRunner};
pub use topology::{ServiceDefinition, Topology, TopologyOptions};
