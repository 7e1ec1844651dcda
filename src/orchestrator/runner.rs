use super::readiness::wait_until_reachable;
use super::workflow::{WorkflowExecutor, WorkflowReport};
use super::ContainerOrchestrator;
use crate::config::ReadinessSettings;
use crate::error::{LookupError, StartupError, WorkflowError};
use crate::topology::{ServiceDefinition, Topology};
use crate::workflow::{ConnectionInfo, WorkflowInvocation};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A started service and where it can be reached.
///
/// Host and port are resolved once, right after the start call, and never
/// change for the rest of the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunningService {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl RunningService {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Brings up services of a [`Topology`] and runs workflows against them.
///
/// One runner serves one invocation. It owns the record of what it started
/// and hands out connection parameters for those services only.
pub struct TopologyRunner {
    pub(super) topology: Arc<Topology>,
    pub(super) orchestrator: Arc<dyn ContainerOrchestrator>,
    pub(super) readiness: ReadinessSettings,
    pub(super) cancel: CancellationToken,
    running: RwLock<HashMap<String, RunningService>>,
    /// Names passed to a successful start call, in start order.
    started: RwLock<Vec<String>>,
}

impl TopologyRunner {
    pub fn new(topology: Arc<Topology>, orchestrator: Arc<dyn ContainerOrchestrator>) -> Self {
        Self {
            topology,
            orchestrator,
            readiness: ReadinessSettings::default(),
            cancel: CancellationToken::new(),
            running: RwLock::new(HashMap::new()),
            started: RwLock::new(Vec::new()),
        }
    }

    pub fn with_readiness(mut self, readiness: ReadinessSettings) -> Self {
        self.readiness = readiness;
        self
    }

    /// Use an externally owned token, e.g. one cancelled by a Ctrl-C handler.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start `services` one at a time and resolve where each is reachable.
    ///
    /// Services this runner already started are skipped.
    pub(super) async fn start_services(
        &self,
        services: &[ServiceDefinition],
    ) -> Result<Vec<RunningService>, StartupError> {
        let mut result = Vec::with_capacity(services.len());
        for service in services {
            if let Some(existing) = self.running.read().get(&service.name) {
                result.push(existing.clone());
                continue;
            }
            if self.cancel.is_cancelled() {
                return Err(StartupError::Cancelled(service.name.clone()));
            }

            tracing::info!(
                "Starting service '{}' ({}) via {}",
                service.name,
                service.image,
                self.orchestrator.name()
            );
            self.orchestrator.start(std::slice::from_ref(service)).await?;
            self.started.write().push(service.name.clone());

            let running = self.resolve(service).await?;
            tracing::debug!("Service '{}' resolved to {}", running.name, running.address());
            self.running
                .write()
                .insert(running.name.clone(), running.clone());
            result.push(running);
        }
        Ok(result)
    }

    async fn resolve(&self, service: &ServiceDefinition) -> Result<RunningService, StartupError> {
        let host = self.orchestrator.resolved_host(service).await?;
        let port = self.orchestrator.resolved_port(service).await?;
        Ok(RunningService {
            name: service.name.clone(),
            host,
            port,
        })
    }

    pub(super) async fn wait_for_readiness(
        &self,
        services: &[RunningService],
    ) -> Result<(), StartupError> {
        if services.is_empty() {
            return Ok(());
        }
        tracing::info!(
            "Waiting for {} service(s) to accept connections (timeout {:?})",
            services.len(),
            self.readiness.timeout
        );
        wait_until_reachable(services, self.readiness, &self.cancel).await
    }

    /// Start the named services and block until each accepts TCP connections.
    ///
    /// Every name is checked before anything is started. There is no
    /// rollback: services started before a failure stay up until
    /// [`teardown`](Self::teardown).
    pub async fn start_and_wait<S: AsRef<str>>(&self, names: &[S]) -> Result<(), StartupError> {
        let selected = self.topology.select(names)?;
        let running = self.start_services(&selected).await?;
        self.wait_for_readiness(&running).await
    }

    /// Record services the orchestrator reports as already running.
    ///
    /// Nothing is started. Returns the names that were found running; the
    /// others stay unstarted.
    pub async fn attach_running<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<String>, StartupError> {
        let selected = self.topology.select(names)?;
        let states = join_all(selected.iter().map(|s| self.orchestrator.is_running(s))).await;
        let mut attached = Vec::new();
        for (service, is_running) in selected.iter().zip(states) {
            if !is_running {
                tracing::debug!("Service '{}' is not running", service.name);
                continue;
            }
            let running = self.resolve(service).await?;
            self.running.write().insert(running.name.clone(), running);
            attached.push(service.name.clone());
        }
        Ok(attached)
    }

    fn running_service(&self, name: &str) -> Result<RunningService, LookupError> {
        self.topology.lookup(name)?;
        self.running
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::NotStarted(name.to_string()))
    }

    /// Host port of the service's advertised port.
    pub fn default_port(&self, name: &str) -> Result<u16, LookupError> {
        self.running_service(name).map(|s| s.port)
    }

    pub fn resolved_host(&self, name: &str) -> Result<String, LookupError> {
        self.running_service(name).map(|s| s.host)
    }

    /// Running services in topology order.
    pub fn running_services(&self) -> Vec<RunningService> {
        let running = self.running.read();
        self.topology
            .names()
            .filter_map(|name| running.get(name).cloned())
            .collect()
    }

    /// Stop everything this runner started, most recent first.
    ///
    /// Best effort: failures are logged and otherwise ignored.
    pub async fn teardown(&self) {
        let names: Vec<String> = std::mem::take(&mut *self.started.write());
        if names.is_empty() {
            return;
        }
        let services: Vec<ServiceDefinition> = names
            .iter()
            .rev()
            .filter_map(|name| self.topology.get(name).cloned())
            .collect();

        tracing::info!("Stopping {} service(s)", services.len());
        if let Err(e) = self.orchestrator.stop(&services).await {
            tracing::warn!("Teardown incomplete: {}", e);
        }
        let mut running = self.running.write();
        for name in &names {
            running.remove(name);
        }
    }

    /// Start the workflow's services, then run its command against them.
    ///
    /// Exit code 0 yields a report; any other code is returned as
    /// [`WorkflowError::UpstreamFailure`] with the code unchanged.
    pub async fn run_workflow(
        &self,
        invocation: &WorkflowInvocation,
    ) -> Result<WorkflowReport, WorkflowError> {
        WorkflowExecutor::new(self).run(invocation).await
    }
}

impl ConnectionInfo for TopologyRunner {
    fn default_port(&self, service: &str) -> Result<u16, LookupError> {
        TopologyRunner::default_port(self, service)
    }

    fn resolved_host(&self, service: &str) -> Result<String, LookupError> {
        TopologyRunner::resolved_host(self, service)
    }
}
