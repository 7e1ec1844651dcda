//! Service configuration types.
//!
//! [`ServiceConfig`] is what a service entry in `topology.yaml` looks like.
//! It is turned into a resolved [`ServiceDefinition`](crate::topology::ServiceDefinition)
//! once presets and the host-port policy have been applied.

use super::Preset;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single service entry in the topology.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub name: String,

    /// Built-in definition to start from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,

    /// Container image; overrides the preset image when both are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Port mappings; replace the preset ports when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<String>>,

    /// Extra environment, applied after the preset's.
    #[serde(default, skip_serializing_if = "EnvironmentConfig::is_empty")]
    pub environment: EnvironmentConfig,

    /// Whether a fixed host port may be bound.
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_host_ports: bool,

    /// Container command arguments; replace the preset command when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    /// Host the service is reachable on when attached to externally provided services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !b
}

/// Environment as written in YAML.
///
/// ```yaml
/// # list form, docker style
/// environment:
///   - KAFKA_BROKER_ID=1
///   - KAFKA_BROKER_ID=2   # later entries win
///
/// # map form
/// environment:
///   KAFKA_BROKER_ID: "1"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentConfig {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        EnvironmentConfig::List(Vec::new())
    }
}

impl EnvironmentConfig {
    pub fn is_empty(&self) -> bool {
        match self {
            EnvironmentConfig::List(l) => l.is_empty(),
            EnvironmentConfig::Map(m) => m.is_empty(),
        }
    }

    /// Convert into ordered `(name, value)` pairs.
    pub fn to_entries(&self) -> Result<Vec<(String, String)>> {
        match self {
            EnvironmentConfig::List(items) => items
                .iter()
                .map(|item| {
                    let (k, v) = item.split_once('=').ok_or_else(|| {
                        Error::Validation(format!(
                            "Environment entry '{}' must have the form NAME=VALUE",
                            item
                        ))
                    })?;
                    Ok((k.to_string(), v.to_string()))
                })
                .collect(),
            EnvironmentConfig::Map(map) => Ok(map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()),
        }
    }
}

/// Ordered environment with replace-on-same-name semantics.
///
/// Setting an existing name replaces its value in place; new names are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvList(Vec<(String, String)>);

impl EnvList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in entries {
            self.set(k, v);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A published port: `[HOST_PORT:]CONTAINER_PORT[/tcp]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortMapping {
    pub container_port: u16,
    /// Fixed host port. `None` lets the runtime choose an ephemeral one.
    pub host_port: Option<u16>,
}

impl PortMapping {
    pub fn ephemeral(container_port: u16) -> Self {
        Self {
            container_port,
            host_port: None,
        }
    }

    pub fn fixed(host_port: u16, container_port: u16) -> Self {
        Self {
            container_port,
            host_port: Some(host_port),
        }
    }

    /// Key docker uses for this port in `.NetworkSettings.Ports`.
    pub fn docker_key(&self) -> String {
        format!("{}/tcp", self.container_port)
    }
}

impl FromStr for PortMapping {
    type Err = String;

    fn from_str(spec: &str) -> std::result::Result<Self, Self::Err> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err("empty port specification".to_string());
        }

        let port_part = match spec.split_once('/') {
            Some((port, "tcp")) => port,
            Some((_, proto)) => {
                return Err(format!(
                    "unsupported protocol '{}' in '{}' (only tcp can be probed)",
                    proto, spec
                ))
            }
            None => spec,
        };

        let parse = |s: &str| -> std::result::Result<u16, String> {
            match s.parse::<u16>() {
                Ok(0) => Err(format!("port 0 not allowed in '{}'", spec)),
                Ok(p) => Ok(p),
                Err(_) => Err(format!("'{}' is not a valid port in '{}'", s, spec)),
            }
        };

        let parts: Vec<&str> = port_part.split(':').collect();
        match parts.as_slice() {
            [container] => Ok(PortMapping::ephemeral(parse(container)?)),
            [host, container] => Ok(PortMapping::fixed(parse(host)?, parse(container)?)),
            _ => Err(format!(
                "'{}' must have the form [HOST_PORT:]CONTAINER_PORT",
                spec
            )),
        }
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host_port {
            Some(host) => write!(f, "{}:{}", host, self.container_port),
            None => write!(f, "{}", self.container_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_mapping() {
        assert_eq!(
            "30123:9092".parse::<PortMapping>().unwrap(),
            PortMapping::fixed(30123, 9092)
        );
        assert_eq!(
            "5432".parse::<PortMapping>().unwrap(),
            PortMapping::ephemeral(5432)
        );
        assert_eq!(
            "8081/tcp".parse::<PortMapping>().unwrap(),
            PortMapping::ephemeral(8081)
        );
    }

    #[test]
    fn test_parse_port_mapping_rejects_bad_specs() {
        assert!("".parse::<PortMapping>().is_err());
        assert!("0".parse::<PortMapping>().is_err());
        assert!("abc".parse::<PortMapping>().is_err());
        assert!("53/udp".parse::<PortMapping>().is_err());
        assert!("127.0.0.1:5432:5432".parse::<PortMapping>().is_err());
        assert!("70000".parse::<PortMapping>().is_err());
    }

    #[test]
    fn test_port_mapping_display() {
        assert_eq!(PortMapping::fixed(30123, 9092).to_string(), "30123:9092");
        assert_eq!(PortMapping::ephemeral(5432).to_string(), "5432");
        assert_eq!(PortMapping::ephemeral(5432).docker_key(), "5432/tcp");
    }

    #[test]
    fn test_env_list_later_entries_replace() {
        let mut env = EnvList::new();
        env.set("A", "1");
        env.set("B", "2");
        env.set("A", "3");
        let entries: Vec<_> = env.iter().collect();
        assert_eq!(entries, vec![("A", "3"), ("B", "2")]);
    }

    #[test]
    fn test_environment_config_list_form() {
        let env = EnvironmentConfig::List(vec![
            "KAFKA_BROKER_ID=1".to_string(),
            "EMPTY=".to_string(),
            "URL=postgres://a=b".to_string(),
        ]);
        let entries = env.to_entries().unwrap();
        assert_eq!(entries[0], ("KAFKA_BROKER_ID".into(), "1".into()));
        assert_eq!(entries[1], ("EMPTY".into(), "".into()));
        assert_eq!(entries[2], ("URL".into(), "postgres://a=b".into()));
    }

    #[test]
    fn test_environment_config_rejects_missing_equals() {
        let env = EnvironmentConfig::List(vec!["NOVALUE".to_string()]);
        assert!(env.to_entries().is_err());
    }

    #[test]
    fn test_environment_config_yaml_forms() {
        let list: EnvironmentConfig = serde_yaml::from_str("- A=1\n- B=2\n").unwrap();
        assert_eq!(list.to_entries().unwrap().len(), 2);
        let map: EnvironmentConfig = serde_yaml::from_str("A: \"1\"\n").unwrap();
        assert_eq!(map.to_entries().unwrap(), vec![("A".into(), "1".into())]);
    }
}
