//! Pure planning: topology + workflow config → [`WorkflowInvocation`].
//!
//! Nothing here touches containers or processes, so a plan can be checked
//! (`topo validate`) or printed (`topo plan`) without Docker.

use super::{ConnectionInfo, Template};
use crate::config::Config;
use crate::error::{Error, LookupError, Result};
use crate::topology::{is_valid_env_name, Topology};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything needed to run one workflow: services, command, env overlay.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowInvocation {
    pub name: String,
    pub services: Vec<String>,
    pub command: Vec<String>,
    pub env: BTreeMap<String, Template>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl WorkflowInvocation {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        services: impl IntoIterator<Item = S>,
        command: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            services: services.into_iter().map(Into::into).collect(),
            command: command.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add an overlay entry. The value may contain placeholders.
    pub fn env(mut self, name: impl Into<String>, value: &str) -> Result<Self> {
        self.env.insert(name.into(), Template::parse(value)?);
        Ok(self)
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Append arguments to the command.
    pub fn with_extra_args(mut self, args: &[String]) -> Self {
        self.command.extend(args.iter().cloned());
        self
    }

    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    /// Check the invocation against a topology.
    pub fn validate(&self, topology: &Topology) -> Result<()> {
        if self.command.is_empty() || self.program().is_empty() {
            return Err(Error::Validation(format!(
                "Workflow '{}' has no command",
                self.name
            )));
        }
        for service in &self.services {
            if !topology.contains(service) {
                return Err(Error::Validation(format!(
                    "Workflow '{}' starts unknown service '{}'",
                    self.name, service
                )));
            }
        }
        for (key, template) in &self.env {
            if !is_valid_env_name(key) {
                return Err(Error::Validation(format!(
                    "Workflow '{}': '{}' is not a valid environment variable name",
                    self.name, key
                )));
            }
            for service in template.services() {
                if !self.services.iter().any(|s| s == service) {
                    return Err(Error::Validation(format!(
                        "Workflow '{}': {} references service '{}', which the workflow does not start",
                        self.name, key, service
                    )));
                }
            }
        }
        Ok(())
    }

    /// Render the overlay with resolved connection parameters.
    pub fn resolve_env(
        &self,
        info: &dyn ConnectionInfo,
    ) -> std::result::Result<BTreeMap<String, String>, LookupError> {
        self.env
            .iter()
            .map(|(k, t)| Ok((k.clone(), t.render(info)?)))
            .collect()
    }

    /// Command line as a copy-pasteable shell string.
    pub fn display_command(&self) -> String {
        self.command
            .iter()
            .map(|arg| shell_escape(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build and validate the invocation for workflow `name`.
///
/// A relative `cwd` is taken relative to `base_dir` (the config directory).
pub fn plan_workflow(
    config: &Config,
    topology: &Topology,
    name: &str,
    base_dir: &Path,
) -> Result<WorkflowInvocation> {
    let workflow = config.workflow(name)?;

    let mut env = BTreeMap::new();
    for (key, value) in &workflow.env {
        let template = Template::parse(value).map_err(|e| match e {
            Error::Template(msg) => {
                Error::Template(format!("workflow '{}', {}: {}", name, key, msg))
            }
            other => other,
        })?;
        env.insert(key.clone(), template);
    }

    let invocation = WorkflowInvocation {
        name: name.to_string(),
        services: workflow.services.clone(),
        command: workflow.command.clone(),
        env,
        cwd: workflow.cwd.as_ref().map(|c| base_dir.join(c)),
    };
    invocation.validate(topology)?;
    Ok(invocation)
}

/// Escape a string for display in a shell command line.
/// Wraps the string in single quotes and escapes any single quotes within.
fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '=' | ':' | ','))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}
