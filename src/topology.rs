//! The resolved, immutable service topology.
//!
//! A [`Topology`] is built once from [`Config`] and then passed around by
//! reference (or `Arc`). Building it applies presets, parses port mappings,
//! applies the host-port policy and checks name uniqueness.

use crate::config::{Config, EnvList, PortMapping, ServiceConfig};
use crate::error::{Error, LookupError, Result, StartupError};
use serde::Serialize;
use std::collections::HashSet;

/// Options that change how the topology is resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyOptions {
    /// Keep fixed host ports even for services with `allow_host_ports: false`.
    pub preserve_ports: bool,
}

/// A fully resolved service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub image: String,
    /// Published ports. The first one is the advertised port.
    pub ports: Vec<PortMapping>,
    pub environment: EnvList,
    pub allow_host_ports: bool,
    pub command: Vec<String>,
    /// Host override for services provided by the environment.
    pub host: Option<String>,
}

impl ServiceDefinition {
    /// The port downstream consumers connect to.
    pub fn advertised_port(&self) -> PortMapping {
        // Non-empty ports is checked when the topology is built.
        self.ports[0]
    }

    fn from_config(config: &ServiceConfig, options: TopologyOptions) -> Result<Self> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Service with empty name".to_string()));
        }
        if name != config.name {
            return Err(Error::Validation(format!(
                "Service name '{}' has surrounding whitespace",
                config.name
            )));
        }

        let defaults = config.preset.map(|p| p.defaults());

        let image = config
            .image
            .clone()
            .or_else(|| defaults.as_ref().map(|d| d.image.clone()))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Service '{}' needs an 'image' or a 'preset'",
                    name
                ))
            })?;

        let port_specs: Vec<String> = match (&config.ports, &defaults) {
            (Some(ports), _) => ports.clone(),
            (None, Some(d)) => d.ports.iter().map(|p| p.to_string()).collect(),
            (None, None) => Vec::new(),
        };
        if port_specs.is_empty() {
            return Err(Error::Validation(format!(
                "Service '{}' declares no ports; readiness needs at least one",
                name
            )));
        }

        let mut ports = Vec::with_capacity(port_specs.len());
        for spec in &port_specs {
            let mut mapping: PortMapping = spec.parse().map_err(|e| {
                Error::Validation(format!("Service '{}': invalid port: {}", name, e))
            })?;
            if mapping.host_port.is_some() && !config.allow_host_ports && !options.preserve_ports {
                tracing::debug!(
                    "Service '{}': host ports not allowed, publishing {} on an ephemeral port",
                    name,
                    mapping.container_port
                );
                mapping.host_port = None;
            }
            ports.push(mapping);
        }

        let mut environment = EnvList::new();
        if let Some(ref d) = defaults {
            environment.extend(d.environment.iter().copied());
        }
        let entries = config.environment.to_entries().map_err(|e| {
            Error::Validation(format!("Service '{}': {}", name, e))
        })?;
        for (key, _) in &entries {
            if !is_valid_env_name(key) {
                return Err(Error::Validation(format!(
                    "Service '{}': '{}' is not a valid environment variable name",
                    name, key
                )));
            }
        }
        environment.extend(entries);

        let command = match (&config.command, &defaults) {
            (Some(cmd), _) => cmd.clone(),
            (None, Some(d)) => d.command.iter().map(|s| s.to_string()).collect(),
            (None, None) => Vec::new(),
        };

        Ok(ServiceDefinition {
            name: name.to_string(),
            image,
            ports,
            environment,
            allow_host_ports: config.allow_host_ports,
            command,
            host: config.host.clone(),
        })
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_valid_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Ordered sequence of services. Order is the author's startup order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Topology {
    services: Vec<ServiceDefinition>,
}

impl Topology {
    pub fn from_config(config: &Config, options: TopologyOptions) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut services = Vec::with_capacity(config.services.len());
        for service in &config.services {
            let def = ServiceDefinition::from_config(service, options)?;
            if !seen.insert(def.name.clone()) {
                return Err(Error::Validation(format!(
                    "Service '{}' is declared more than once",
                    def.name
                )));
            }
            services.push(def);
        }
        Ok(Self { services })
    }

    /// Build directly from definitions, checking name uniqueness and ports.
    pub fn new(services: Vec<ServiceDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in &services {
            if def.ports.is_empty() {
                return Err(Error::Validation(format!(
                    "Service '{}' declares no ports; readiness needs at least one",
                    def.name
                )));
            }
            if !seen.insert(def.name.as_str()) {
                return Err(Error::Validation(format!(
                    "Service '{}' is declared more than once",
                    def.name
                )));
            }
        }
        Ok(Self { services })
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn lookup(&self, name: &str) -> std::result::Result<&ServiceDefinition, LookupError> {
        self.get(name)
            .ok_or_else(|| LookupError::UnknownService(name.to_string()))
    }

    pub fn services(&self) -> &[ServiceDefinition] {
        &self.services
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Resolve a requested subset, keeping request order and dropping repeats.
    ///
    /// Fails on the first name that is not declared.
    pub fn select<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> std::result::Result<Vec<ServiceDefinition>, StartupError> {
        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let def = self
                .get(name)
                .ok_or_else(|| StartupError::UnknownService(name.to_string()))?;
            if seen.insert(name) {
                selected.push(def.clone());
            }
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvironmentConfig, Parser, Preset};

    fn service(name: &str) -> ServiceConfig {
        ServiceConfig {
            name: name.to_string(),
            image: Some("busybox".to_string()),
            ports: Some(vec!["8080".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_preset_kafka_with_fixed_port() {
        let config = Parser::new()
            .parse_config(
                r#"
services:
  - name: kafka
    preset: kafka
    ports: ["30123:9092"]
    allow_host_ports: true
    environment:
      - KAFKA_ADVERTISED_LISTENERS=HOST://localhost:30123,PLAINTEXT://kafka:9092
      - KAFKA_LISTENER_SECURITY_PROTOCOL_MAP=HOST:PLAINTEXT,PLAINTEXT:PLAINTEXT
"#,
            )
            .unwrap();
        let topology = Topology::from_config(&config, TopologyOptions::default()).unwrap();
        let kafka = topology.get("kafka").unwrap();

        assert_eq!(kafka.image, "confluentinc/cp-kafka:7.0.1");
        assert_eq!(kafka.advertised_port(), PortMapping::fixed(30123, 9092));
        // later entries replace the preset value in place
        assert_eq!(
            kafka.environment.get("KAFKA_ADVERTISED_LISTENERS"),
            Some("HOST://localhost:30123,PLAINTEXT://kafka:9092")
        );
        assert_eq!(
            kafka.environment.get("KAFKA_LISTENER_SECURITY_PROTOCOL_MAP"),
            Some("HOST:PLAINTEXT,PLAINTEXT:PLAINTEXT")
        );
        assert_eq!(kafka.environment.get("KAFKA_BROKER_ID"), Some("1"));
    }

    #[test]
    fn test_host_port_stripped_when_not_allowed() {
        let mut svc = service("db");
        svc.ports = Some(vec!["15432:5432".to_string()]);
        let config = Config {
            services: vec![svc],
            ..Default::default()
        };

        let topology = Topology::from_config(&config, TopologyOptions::default()).unwrap();
        assert_eq!(
            topology.get("db").unwrap().advertised_port(),
            PortMapping::ephemeral(5432)
        );

        let preserved = Topology::from_config(
            &config,
            TopologyOptions {
                preserve_ports: true,
            },
        )
        .unwrap();
        assert_eq!(
            preserved.get("db").unwrap().advertised_port(),
            PortMapping::fixed(15432, 5432)
        );
    }

    #[test]
    fn test_image_override_on_preset() {
        let config = Config {
            services: vec![ServiceConfig {
                name: "postgres".to_string(),
                preset: Some(Preset::Postgres),
                image: Some("postgres:14.2".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let topology = Topology::from_config(&config, TopologyOptions::default()).unwrap();
        let pg = topology.get("postgres").unwrap();
        assert_eq!(pg.image, "postgres:14.2");
        assert_eq!(pg.advertised_port(), PortMapping::ephemeral(5432));
        assert_eq!(pg.command[0], "postgres");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = Config {
            services: vec![service("a"), service("a")],
            ..Default::default()
        };
        let err = Topology::from_config(&config, TopologyOptions::default()).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_missing_image_and_ports_rejected() {
        let mut no_image = service("a");
        no_image.image = None;
        let config = Config {
            services: vec![no_image],
            ..Default::default()
        };
        assert!(Topology::from_config(&config, TopologyOptions::default()).is_err());

        let mut no_ports = service("b");
        no_ports.ports = None;
        let config = Config {
            services: vec![no_ports],
            ..Default::default()
        };
        assert!(Topology::from_config(&config, TopologyOptions::default()).is_err());
    }

    #[test]
    fn test_invalid_env_name_rejected() {
        let mut svc = service("a");
        svc.environment = EnvironmentConfig::List(vec!["1BAD=x".to_string()]);
        let config = Config {
            services: vec![svc],
            ..Default::default()
        };
        assert!(Topology::from_config(&config, TopologyOptions::default()).is_err());
    }

    #[test]
    fn test_select_keeps_order_and_dedupes() {
        let config = Config {
            services: vec![service("a"), service("b"), service("c")],
            ..Default::default()
        };
        let topology = Topology::from_config(&config, TopologyOptions::default()).unwrap();
        let selected = topology.select(&["c", "a", "c"]).unwrap();
        let names: Vec<_> = selected.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);

        let err = topology.select(&["a", "redis"]).unwrap_err();
        assert!(matches!(err, StartupError::UnknownService(ref n) if n == "redis"));
    }

    #[test]
    fn test_env_name_validation() {
        assert!(is_valid_env_name("KAFKA_ADDRS"));
        assert!(is_valid_env_name("_x1"));
        assert!(!is_valid_env_name(""));
        assert!(!is_valid_env_name("1A"));
        assert!(!is_valid_env_name("A-B"));
    }
}
