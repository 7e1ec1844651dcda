// Allow unused_assignments at module level because thiserror's generated code
// for struct variants triggers false positive warnings - the fields ARE used
// in the Display impl but rustc's lint pass doesn't see this.
#![allow(unused_assignments)]

use crate::docker::DockerError;
use miette::Diagnostic;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure while bringing services up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Service '{0}' is not part of the topology")]
    UnknownService(String),

    #[error("Failed to start service '{service}': {cause}")]
    OrchestratorFailure { service: String, cause: String },

    #[error("Timeout waiting for service '{service}' to accept TCP connections on {address} (waited {:?})", .timeout)]
    Timeout {
        service: String,
        address: String,
        timeout: Duration,
    },

    #[error("Startup cancelled while waiting for service '{0}'")]
    Cancelled(String),
}

impl StartupError {
    /// Name of the service this failure is about.
    pub fn service(&self) -> &str {
        match self {
            StartupError::UnknownService(s) | StartupError::Cancelled(s) => s,
            StartupError::OrchestratorFailure { service, .. }
            | StartupError::Timeout { service, .. } => service,
        }
    }
}

/// Failure looking up connection parameters of a service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Service '{0}' is not part of the topology")]
    UnknownService(String),

    #[error("Service '{0}' has not been started")]
    NotStarted(String),
}

/// Failure running a workflow end to end.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Failed to launch '{program}': {source}")]
    SpawnFailure {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Command exited with code {0}")]
    UpstreamFailure(i32),

    #[error("Workflow cancelled")]
    Cancelled,
}

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(topo::config::validation),
        help("Fix the reported problem, then check again with `topo validate`")
    )]
    Validation(String),

    #[error("Workflow not found: {0}")]
    #[diagnostic(
        code(topo::workflow::not_found),
        help("List the workflows declared under 'workflows:' in topology.yaml")
    )]
    WorkflowNotFound(String),

    #[error("Template error: {0}")]
    #[diagnostic(code(topo::template::invalid))]
    Template(String),

    #[error("Docker error: {0}")]
    #[diagnostic(
        code(topo::docker::error),
        help("Check that Docker is running with `docker ps`")
    )]
    Docker(#[from] DockerError),

    #[error(transparent)]
    #[diagnostic(code(topo::service::startup))]
    Startup(#[from] StartupError),

    #[error(transparent)]
    #[diagnostic(code(topo::service::lookup))]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    #[diagnostic(code(topo::workflow::failed))]
    Workflow(#[from] WorkflowError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::Config(msg) if msg.contains("Could not find") => Some(
                "Create a topology.yaml or point at one with --config".to_string(),
            ),
            Error::Config(_) | Error::Validation(_) | Error::Parse(_) | Error::Yaml(_) => {
                Some("Validate your config with: topo validate".to_string())
            }
            Error::WorkflowNotFound(_) => {
                Some("Show what a workflow would do with: topo plan <workflow>".to_string())
            }
            Error::Docker(_) => Some("Check that Docker is running: docker ps".to_string()),
            Error::Startup(e) | Error::Workflow(WorkflowError::Startup(e)) => {
                startup_suggestion(e)
            }
            Error::Lookup(e) | Error::Workflow(WorkflowError::Lookup(e)) => lookup_suggestion(e),
            Error::Workflow(WorkflowError::SpawnFailure { program, .. }) => Some(format!(
                "Check that '{}' is installed and on PATH",
                program
            )),
            _ => None,
        }
    }

    /// Formats the error with its suggestion (if any) for user-friendly display.
    pub fn with_suggestion(&self) -> String {
        match self.suggestion() {
            Some(suggestion) => format!("{}\n\nHint: {}", self, suggestion),
            None => self.to_string(),
        }
    }
}

fn startup_suggestion(e: &StartupError) -> Option<String> {
    match e {
        StartupError::UnknownService(_) => {
            Some("List the declared services with: topo services".to_string())
        }
        StartupError::OrchestratorFailure { .. } => Some(
            "Check that Docker is running and the image can be pulled. A fixed host port may already be in use."
                .to_string(),
        ),
        StartupError::Timeout { service, .. } => Some(format!(
            "Inspect the container with: docker logs topo-<project>-{}\nOr raise readiness.timeout in topology.yaml",
            service
        )),
        StartupError::Cancelled(_) => None,
    }
}

fn lookup_suggestion(e: &LookupError) -> Option<String> {
    match e {
        LookupError::UnknownService(_) => {
            Some("List the declared services with: topo services".to_string())
        }
        LookupError::NotStarted(name) => Some(format!("Start the service with: topo up {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_names_the_service() {
        let err = StartupError::Timeout {
            service: "kafka".to_string(),
            address: "localhost:30123".to_string(),
            timeout: Duration::from_secs(60),
        };
        assert_eq!(err.service(), "kafka");
        assert!(err.to_string().contains("'kafka'"));
        assert!(err.to_string().contains("localhost:30123"));
    }

    #[test]
    fn upstream_failure_keeps_code() {
        let err = WorkflowError::UpstreamFailure(3);
        assert!(matches!(err, WorkflowError::UpstreamFailure(3)));
        assert_eq!(err.to_string(), "Command exited with code 3");
    }

    #[test]
    fn not_started_suggests_up() {
        let err = Error::Lookup(LookupError::NotStarted("postgres".to_string()));
        let hint = err.suggestion().unwrap();
        assert!(hint.contains("topo up postgres"));
    }

    #[test]
    fn nested_startup_error_gets_hint() {
        let err = Error::Workflow(WorkflowError::Startup(StartupError::UnknownService(
            "redis".to_string(),
        )));
        assert!(err.with_suggestion().contains("Hint: List the declared services"));
    }

    #[test]
    fn validation_help_points_back_to_validate() {
        let err = Error::Validation("readiness.interval must be greater than zero".to_string());
        let help = err.help().unwrap().to_string();
        assert!(help.contains("topo validate"));
        assert!(!help.contains("full list"));
    }
}
