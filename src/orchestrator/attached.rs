use super::{ContainerOrchestrator, OrchestratorError};
use crate::topology::ServiceDefinition;
use async_trait::async_trait;

/// Services provided by the environment: CI service containers, a local
/// stack started by hand.
///
/// Nothing is started or stopped. A service is expected on its `host`
/// (default `localhost`) at its fixed host port, or at its container port
/// when none is fixed.
#[derive(Debug, Clone, Default)]
pub struct AttachedOrchestrator;

impl AttachedOrchestrator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContainerOrchestrator for AttachedOrchestrator {
    fn name(&self) -> &'static str {
        "attached"
    }

    async fn start(&self, services: &[ServiceDefinition]) -> Result<(), OrchestratorError> {
        for service in services {
            tracing::debug!("Attaching to '{}' (not started by topo)", service.name);
        }
        Ok(())
    }

    async fn stop(&self, _services: &[ServiceDefinition]) -> Result<(), OrchestratorError> {
        Ok(())
    }

    async fn resolved_port(&self, service: &ServiceDefinition) -> Result<u16, OrchestratorError> {
        let port = service.advertised_port();
        Ok(port.host_port.unwrap_or(port.container_port))
    }

    async fn resolved_host(
        &self,
        service: &ServiceDefinition,
    ) -> Result<String, OrchestratorError> {
        Ok(service
            .host
            .clone()
            .unwrap_or_else(|| "localhost".to_string()))
    }

    async fn is_running(&self, _service: &ServiceDefinition) -> bool {
        true
    }
}
