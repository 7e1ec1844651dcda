//! [`ContainerOrchestrator`] backed by the `docker` CLI.
//!
//! Every container of a project joins one bridge network (`topo-<project>`)
//! under its service name as network alias, so services reach each other as
//! `kafka:9092` while the host reaches them through ports published on
//! `127.0.0.1`.

use super::{ContainerOrchestrator, OrchestratorError};
use crate::docker::{self, DockerClient, PROJECT_LABEL, SERVICE_LABEL};
use crate::topology::ServiceDefinition;
use async_trait::async_trait;
use std::time::Duration;

/// Timeout for short docker commands (rm, inspect, run -d).
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
/// Pulling a large image on a cold cache is slow.
const PULL_TIMEOUT: Duration = Duration::from_secs(600);
/// Seconds `docker stop` waits before killing.
const STOP_GRACE_SECS: u32 = 10;
/// Address host ports are published on.
const PUBLISH_ADDRESS: &str = "127.0.0.1";

pub struct DockerOrchestrator {
    client: DockerClient,
    project: String,
}

impl DockerOrchestrator {
    pub fn new(project: impl Into<String>) -> Self {
        Self::with_client(DockerClient::new(), project)
    }

    pub fn with_client(client: DockerClient, project: impl Into<String>) -> Self {
        Self {
            client,
            project: project.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn container_name(&self, service: &ServiceDefinition) -> String {
        docker::container_name(&self.project, &service.name)
    }

    pub fn network_name(&self) -> String {
        docker::network_name(&self.project)
    }

    fn project_label(&self) -> String {
        format!("{}={}", PROJECT_LABEL, self.project)
    }

    /// Arguments following `docker run -d` for one service.
    pub fn run_args(&self, service: &ServiceDefinition) -> Vec<String> {
        let mut args = vec![
            "--name".to_string(),
            self.container_name(service),
            "--network".to_string(),
            self.network_name(),
            "--network-alias".to_string(),
            service.name.clone(),
            "--label".to_string(),
            self.project_label(),
            "--label".to_string(),
            format!("{}={}", SERVICE_LABEL, service.name),
        ];

        for (key, value) in service.environment.iter() {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }

        for port in &service.ports {
            args.push("-p".to_string());
            args.push(match port.host_port {
                Some(host) => format!("{}:{}:{}", PUBLISH_ADDRESS, host, port.container_port),
                None => format!("{}::{}", PUBLISH_ADDRESS, port.container_port),
            });
        }

        args.push(service.image.clone());
        args.extend(service.command.iter().cloned());
        args
    }

    async fn ensure_network(&self) -> Result<(), docker::DockerError> {
        let network = self.network_name();
        if self.client.network_exists(&network).await {
            return Ok(());
        }
        tracing::debug!("Creating network {}", network);
        self.client
            .network_create(&network, &[self.project_label()])
            .await
    }

    async fn start_one(&self, service: &ServiceDefinition) -> Result<(), OrchestratorError> {
        let container = self.container_name(service);
        let fail = |e: docker::DockerError| OrchestratorError::new(&service.name, e);

        // A container left behind by an earlier run would hold the name.
        self.client
            .rm_force(&container, COMMAND_TIMEOUT)
            .await
            .map_err(fail)?;

        if !self.client.image_exists(&service.image).await {
            tracing::info!("Pulling image {} for '{}'", service.image, service.name);
            self.client
                .pull(&service.image, PULL_TIMEOUT)
                .await
                .map_err(fail)?;
        }

        let id = self
            .client
            .run_detached(&self.run_args(service), COMMAND_TIMEOUT)
            .await
            .map_err(fail)?;
        tracing::debug!(
            "Started container {} ({}) for '{}'",
            container,
            short_id(&id),
            service.name
        );
        Ok(())
    }
}

#[async_trait]
impl ContainerOrchestrator for DockerOrchestrator {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn start(&self, services: &[ServiceDefinition]) -> Result<(), OrchestratorError> {
        if let Some(first) = services.first() {
            self.ensure_network()
                .await
                .map_err(|e| OrchestratorError::new(&first.name, e))?;
        }
        for service in services {
            self.start_one(service).await?;
        }
        Ok(())
    }

    async fn stop(&self, services: &[ServiceDefinition]) -> Result<(), OrchestratorError> {
        let mut first_error = None;
        for service in services {
            let container = self.container_name(service);
            match self
                .client
                .stop_and_remove(&container, STOP_GRACE_SECS, COMMAND_TIMEOUT)
                .await
            {
                Ok(true) => tracing::debug!("Stopped container {}", container),
                Ok(false) => tracing::debug!("Container {} was not running", container),
                Err(e) => {
                    tracing::warn!("Failed to remove container {}: {}", container, e);
                    first_error.get_or_insert_with(|| OrchestratorError::new(&service.name, e));
                }
            }
        }

        // Fails while containers of other invocations are still attached.
        if let Err(e) = self.client.network_rm(&self.network_name()).await {
            tracing::debug!("Network {} not removed: {}", self.network_name(), e);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn resolved_port(&self, service: &ServiceDefinition) -> Result<u16, OrchestratorError> {
        let advertised = service.advertised_port();
        let key = advertised.docker_key();
        let ports = self
            .client
            .inspect_ports(&self.container_name(service), COMMAND_TIMEOUT)
            .await
            .map_err(|e| OrchestratorError::new(&service.name, e))?;
        ports.get(&key).copied().ok_or_else(|| {
            OrchestratorError::new(&service.name, format!("port {} is not published", key))
        })
    }

    async fn resolved_host(
        &self,
        _service: &ServiceDefinition,
    ) -> Result<String, OrchestratorError> {
        Ok("localhost".to_string())
    }

    async fn is_running(&self, service: &ServiceDefinition) -> bool {
        self.client
            .is_running(&self.container_name(service), COMMAND_TIMEOUT)
            .await
    }
}

/// First 12 characters of a container id, as `docker ps` shows it.
fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
