use crate::error::StartupError;
use crate::topology::ServiceDefinition;
use async_trait::async_trait;
use thiserror::Error;

/// A collaborator call failed for one service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("service '{service}': {cause}")]
pub struct OrchestratorError {
    pub service: String,
    pub cause: String,
}

impl OrchestratorError {
    pub fn new(service: impl Into<String>, cause: impl ToString) -> Self {
        Self {
            service: service.into(),
            cause: cause.to_string(),
        }
    }
}

impl From<OrchestratorError> for StartupError {
    fn from(e: OrchestratorError) -> Self {
        StartupError::OrchestratorFailure {
            service: e.service,
            cause: e.cause,
        }
    }
}

/// Whatever actually runs the service containers.
///
/// The runner only talks to this trait: it asks for services to be started
/// and stopped, and for the host and host port a started service is reachable
/// on. Port publishing and image handling are the implementation's business.
#[async_trait]
pub trait ContainerOrchestrator: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Start `services` in the given order.
    async fn start(&self, services: &[ServiceDefinition]) -> Result<(), OrchestratorError>;

    /// Stop `services` in the given order. Stopping a service that is not
    /// running is not an error.
    async fn stop(&self, services: &[ServiceDefinition]) -> Result<(), OrchestratorError>;

    /// Host port the service's advertised port is reachable on.
    async fn resolved_port(&self, service: &ServiceDefinition) -> Result<u16, OrchestratorError>;

    /// Host the service is reachable on from this machine.
    async fn resolved_host(&self, service: &ServiceDefinition)
        -> Result<String, OrchestratorError>;

    async fn is_running(&self, service: &ServiceDefinition) -> bool;
}
