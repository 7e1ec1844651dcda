//! Centralized Docker CLI client.
//!
//! All Docker CLI interactions go through `DockerClient`, which provides
//! consistent timeout handling, error mapping to [`DockerError`], and a single
//! point where `Command::new("docker")` is constructed.

use super::DockerError;
use std::collections::HashMap;
use std::process::Output;
use std::time::Duration;

/// Centralized client for Docker CLI operations.
#[derive(Debug, Clone)]
pub struct DockerClient {
    binary: String,
}

impl DockerClient {
    pub fn new() -> Self {
        Self::with_binary("docker")
    }

    /// Use a different CLI binary (e.g. `podman`).
    pub fn with_binary(binary: impl Into<String>) -> Self {
        DockerClient {
            binary: binary.into(),
        }
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// Run a docker command with a timeout, returning raw Output.
    async fn run(&self, args: &[&str], timeout: Duration) -> Result<Output, DockerError> {
        let cmd_str = self.describe(args);
        tracing::debug!("Running: {}", cmd_str);

        let result = tokio::time::timeout(
            timeout,
            tokio::process::Command::new(&self.binary)
                .args(args)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(DockerError::exec_failed(cmd_str, e)),
            Err(_) => Err(DockerError::timeout(cmd_str, timeout)),
        }
    }

    /// Run a docker command with a timeout, returning Output only if exit 0.
    async fn run_success(&self, args: &[&str], timeout: Duration) -> Result<Output, DockerError> {
        let output = self.run(args, timeout).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(DockerError::failed(self.describe(args), &output))
        }
    }

    // ========================================================================
    // Container lifecycle
    // ========================================================================

    /// Force-remove a container. Returns `Ok(())` if container doesn't exist.
    pub async fn rm_force(&self, container: &str, timeout: Duration) -> Result<(), DockerError> {
        let output = self.run(&["rm", "-f", container], timeout).await?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No such container") {
            return Ok(());
        }
        Err(DockerError::failed("docker rm -f", &output))
    }

    /// Stop a container with a specific grace period, then remove it.
    ///
    /// Returns whether the stop itself succeeded. Removal is always attempted.
    pub async fn stop_and_remove(
        &self,
        container: &str,
        grace_secs: u32,
        timeout: Duration,
    ) -> Result<bool, DockerError> {
        let grace = grace_secs.to_string();
        let output = self
            .run(&["stop", "-t", &grace, container], timeout)
            .await?;
        let stopped = output.status.success();
        self.rm_force(container, timeout).await?;
        Ok(stopped)
    }

    /// Run a container in detached mode. Returns the container ID on success.
    ///
    /// `args` are everything after `docker run -d`.
    pub async fn run_detached(
        &self,
        args: &[String],
        timeout: Duration,
    ) -> Result<String, DockerError> {
        let mut full: Vec<&str> = vec!["run", "-d"];
        full.extend(args.iter().map(String::as_str));
        let output = self.run_success(&full, timeout).await?;
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            return Err(DockerError::unexpected(
                self.describe(&["run", "-d"]),
                "no container id printed",
            ));
        }
        Ok(id)
    }

    /// Pull a Docker image.
    pub async fn pull(&self, image: &str, timeout: Duration) -> Result<(), DockerError> {
        let output = self.run(&["pull", image], timeout).await?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        // "up to date" or "already exists" aren't real failures
        if stderr.contains("up to date") || stderr.contains("already exists") {
            return Ok(());
        }
        Err(DockerError::failed("docker pull", &output))
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Check if a container is running.
    pub async fn is_running(&self, container: &str, timeout: Duration) -> bool {
        let output = self
            .run(&["inspect", "-f", "{{.State.Running}}", container], timeout)
            .await;
        match output {
            Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout).trim() == "true",
            _ => false,
        }
    }

    /// Get published port mappings for a container.
    ///
    /// Returns a map from container port (e.g. "5432/tcp") to host port.
    pub async fn inspect_ports(
        &self,
        container: &str,
        timeout: Duration,
    ) -> Result<HashMap<String, u16>, DockerError> {
        let args = [
            "inspect",
            "--format={{json .NetworkSettings.Ports}}",
            container,
        ];
        let output = self.run_success(&args, timeout).await?;
        let json_str = String::from_utf8_lossy(&output.stdout);
        parse_port_bindings(&json_str).map_err(|detail| {
            DockerError::unexpected(self.describe(&args), detail)
        })
    }

    /// Check if an image exists locally.
    pub async fn image_exists(&self, image: &str) -> bool {
        match self
            .run(&["inspect", "--type=image", image], Duration::from_secs(10))
            .await
        {
            Ok(o) => o.status.success(),
            Err(_) => false,
        }
    }

    // ========================================================================
    // Networks
    // ========================================================================

    pub async fn network_exists(&self, network: &str) -> bool {
        match self
            .run(&["network", "inspect", network], Duration::from_secs(10))
            .await
        {
            Ok(o) => o.status.success(),
            Err(_) => false,
        }
    }

    /// Create a bridge network, tolerating a concurrent creation.
    pub async fn network_create(
        &self,
        network: &str,
        labels: &[String],
    ) -> Result<(), DockerError> {
        let mut args = vec!["network", "create"];
        for label in labels {
            args.push("--label");
            args.push(label);
        }
        args.push(network);
        let output = self.run(&args, Duration::from_secs(30)).await?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("already exists") {
            return Ok(());
        }
        Err(DockerError::failed("docker network create", &output))
    }

    pub async fn network_rm(&self, network: &str) -> Result<(), DockerError> {
        self.run_success(&["network", "rm", network], Duration::from_secs(30))
            .await
            .map(|_| ())
    }
}

impl Default for DockerClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `{{json .NetworkSettings.Ports}}` output.
///
/// Input looks like `{"5432/tcp":[{"HostIp":"127.0.0.1","HostPort":"59890"}]}`.
/// Unpublished ports carry `null` bindings and are skipped.
pub(crate) fn parse_port_bindings(json_str: &str) -> Result<HashMap<String, u16>, String> {
    let ports_json: serde_json::Value = serde_json::from_str(json_str.trim())
        .map_err(|e| format!("invalid port JSON: {}", e))?;

    let mut mappings = HashMap::new();
    let Some(ports_obj) = ports_json.as_object() else {
        // `null` when the container publishes nothing
        return Ok(mappings);
    };

    for (container_port, bindings) in ports_obj {
        let host_port = bindings
            .as_array()
            .and_then(|a| a.first())
            .and_then(|b| b.get("HostPort"))
            .and_then(|v| v.as_str());
        if let Some(host_port) = host_port {
            let port = host_port
                .parse::<u16>()
                .map_err(|_| format!("invalid host port '{}' for {}", host_port, container_port))?;
            mappings.insert(container_port.clone(), port);
        }
    }
    Ok(mappings)
}
