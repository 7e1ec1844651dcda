//! Core configuration types.
//!
//! This module contains the root [`Config`] struct for `topology.yaml`.

use super::{parse_duration_string, ServiceConfig};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default interval between TCP connection attempts.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(200);
/// Default time a service gets to start accepting connections.
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(60);
/// Default timeout of a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Root configuration structure for topology.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Scopes container and network names. Defaults to the config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Ordered list of services; order is startup order.
    #[serde(default)]
    pub services: Vec<ServiceConfig>,

    #[serde(default)]
    pub workflows: BTreeMap<String, WorkflowConfig>,
}

impl Config {
    pub fn workflow(&self, name: &str) -> Result<&WorkflowConfig> {
        self.workflows
            .get(name)
            .ok_or_else(|| Error::WorkflowNotFound(name.to_string()))
    }
}

/// Readiness probing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadinessConfig {
    /// Pause between connection attempts (e.g. "200ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Total time per service (e.g. "60s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Timeout of one connection attempt (e.g. "1s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<String>,
}

impl ReadinessConfig {
    /// Parse the durations. Every one of them must be greater than zero.
    pub fn settings(&self) -> Result<ReadinessSettings> {
        Ok(ReadinessSettings {
            interval: parse_field("readiness.interval", &self.interval, DEFAULT_PROBE_INTERVAL)?,
            timeout: parse_field("readiness.timeout", &self.timeout, DEFAULT_READINESS_TIMEOUT)?,
            connect_timeout: parse_field(
                "readiness.connect_timeout",
                &self.connect_timeout,
                DEFAULT_CONNECT_TIMEOUT,
            )?,
        })
    }
}

fn parse_field(field: &str, value: &Option<String>, default: Duration) -> Result<Duration> {
    let Some(s) = value else {
        return Ok(default);
    };
    let duration = parse_duration_string(s).ok_or_else(|| {
        Error::Validation(format!(
            "{} '{}' is not a duration (use e.g. \"200ms\", \"60s\", \"1m\")",
            field, s
        ))
    })?;
    if duration.is_zero() {
        return Err(Error::Validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(duration)
}

/// Resolved readiness settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessSettings {
    pub interval: Duration,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PROBE_INTERVAL,
            timeout: DEFAULT_READINESS_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// A named workflow: which services to bring up and what to run against them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Services to start, in order.
    #[serde(default)]
    pub services: Vec<String>,

    /// Program and arguments. Not run through a shell.
    #[serde(default)]
    pub command: Vec<String>,

    /// Environment overlay. Values may use `{{port:NAME}}` and `{{host:NAME}}`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Working directory, relative to the config file directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_defaults() {
        let settings = ReadinessConfig::default().settings().unwrap();
        assert_eq!(settings, ReadinessSettings::default());
        assert_eq!(settings.interval, Duration::from_millis(200));
        assert_eq!(settings.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_readiness_overrides() {
        let cfg = ReadinessConfig {
            interval: Some("50ms".to_string()),
            timeout: Some("2m".to_string()),
            connect_timeout: None,
        };
        let settings = cfg.settings().unwrap();
        assert_eq!(settings.interval, Duration::from_millis(50));
        assert_eq!(settings.timeout, Duration::from_secs(120));
        assert_eq!(settings.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn test_readiness_rejects_bad_duration() {
        let cfg = ReadinessConfig {
            timeout: Some("soon".to_string()),
            ..Default::default()
        };
        let err = cfg.settings().unwrap_err();
        assert!(err.to_string().contains("readiness.timeout"));
    }

    #[test]
    fn test_readiness_rejects_zero_durations() {
        for field in ["interval", "timeout", "connect_timeout"] {
            let cfg: ReadinessConfig =
                serde_yaml::from_str(&format!("{}: 0ms", field)).unwrap();
            let err = cfg.settings().unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
            assert_eq!(
                err.to_string(),
                format!(
                    "Invalid configuration: readiness.{} must be greater than zero",
                    field
                )
            );
        }
    }

    #[test]
    fn test_missing_workflow() {
        let config = Config::default();
        assert!(matches!(
            config.workflow("default"),
            Err(Error::WorkflowNotFound(_))
        ));
    }
}
