//! Shared fixtures for runner tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use service_topology::config::{EnvList, PortMapping};
use service_topology::orchestrator::{ContainerOrchestrator, OrchestratorError};
use service_topology::ServiceDefinition;
use std::collections::{HashMap, HashSet};
use std::net::TcpListener;

/// Runs "services" as plain TCP listeners on 127.0.0.1.
///
/// A fixed host port is bound as is, otherwise the OS picks one. Services
/// named in `silent` are never bound, so readiness never succeeds for them.
#[derive(Default)]
pub struct LocalOrchestrator {
    listeners: Mutex<HashMap<String, TcpListener>>,
    silent: HashSet<String>,
    fail_start: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl LocalOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn silent(mut self, service: &str) -> Self {
        self.silent.insert(service.to_string());
        self
    }

    pub fn failing(mut self, service: &str) -> Self {
        self.fail_start.insert(service.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ContainerOrchestrator for LocalOrchestrator {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn start(&self, services: &[ServiceDefinition]) -> Result<(), OrchestratorError> {
        for service in services {
            self.record(format!("start {}", service.name));
            if self.fail_start.contains(&service.name) {
                return Err(OrchestratorError::new(&service.name, "image not found"));
            }
            if self.silent.contains(&service.name) {
                continue;
            }
            let port = service.advertised_port().host_port.unwrap_or(0);
            let listener = TcpListener::bind(("127.0.0.1", port))
                .map_err(|e| OrchestratorError::new(&service.name, e))?;
            self.listeners.lock().insert(service.name.clone(), listener);
        }
        Ok(())
    }

    async fn stop(&self, services: &[ServiceDefinition]) -> Result<(), OrchestratorError> {
        for service in services {
            self.record(format!("stop {}", service.name));
            self.listeners.lock().remove(&service.name);
        }
        Ok(())
    }

    async fn resolved_port(&self, service: &ServiceDefinition) -> Result<u16, OrchestratorError> {
        if let Some(listener) = self.listeners.lock().get(&service.name) {
            return listener
                .local_addr()
                .map(|a| a.port())
                .map_err(|e| OrchestratorError::new(&service.name, e));
        }
        // Silent service: a port nobody listens on.
        let probe = TcpListener::bind("127.0.0.1:0")
            .map_err(|e| OrchestratorError::new(&service.name, e))?;
        probe
            .local_addr()
            .map(|a| a.port())
            .map_err(|e| OrchestratorError::new(&service.name, e))
    }

    async fn resolved_host(
        &self,
        _service: &ServiceDefinition,
    ) -> Result<String, OrchestratorError> {
        Ok("127.0.0.1".to_string())
    }

    async fn is_running(&self, service: &ServiceDefinition) -> bool {
        self.listeners.lock().contains_key(&service.name)
    }
}

pub fn service(name: &str, port: &str) -> ServiceDefinition {
    ServiceDefinition {
        name: name.to_string(),
        image: format!("{}:test", name),
        ports: vec![port.parse::<PortMapping>().unwrap()],
        environment: EnvList::new(),
        allow_host_ports: true,
        command: vec![],
        host: None,
    }
}
