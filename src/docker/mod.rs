//! Docker CLI access and the naming scheme for topology-owned resources.

pub mod client;
pub mod error;

pub use client::DockerClient;
pub use error::DockerError;

use std::path::Path;

/// Label marking containers and networks created by this tool.
pub const PROJECT_LABEL: &str = "com.service-topology.project";
/// Label carrying the topology service name of a container.
pub const SERVICE_LABEL: &str = "com.service-topology.service";

/// Container name for a service: `topo-{project}-{service}`.
pub fn container_name(project: &str, service: &str) -> String {
    format!(
        "topo-{}-{}",
        sanitize_name_component(project),
        sanitize_name_component(service)
    )
}

/// Network shared by all containers of a project: `topo-{project}`.
pub fn network_name(project: &str) -> String {
    format!("topo-{}", sanitize_name_component(project))
}

/// Derive a project name from the directory holding the config file.
///
/// `{dirname}-{hash}` where the hash is taken over the canonical path, so two
/// checkouts with the same directory name on one CI host do not collide.
pub fn project_from_dir(dir: &Path) -> String {
    let canonical = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    let base = canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "topo".to_string());
    let hash = fnv1a_32(canonical.as_os_str().as_encoded_bytes());
    // 23 + '-' + 8 hex digits keeps the project within one 32-char component
    let base: String = sanitize_name_component(&base).chars().take(23).collect();
    format!("{}-{:08x}", base, hash)
}

/// Sanitize a string for use in Docker object names.
///
/// Docker names must match `[a-zA-Z0-9][a-zA-Z0-9_.-]*`. Invalid characters
/// become `_`, the result is capped at 32 characters and never starts with a
/// non-alphanumeric character.
pub fn sanitize_name_component(input: &str) -> String {
    const MAX_COMPONENT_LEN: usize = 32;

    // Every char is ASCII after this map, so byte slicing below is safe.
    let sanitized: String = input
        .chars()
        .take(MAX_COMPONENT_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        return "unnamed".to_string();
    }
    if sanitized.starts_with(|c: char| !c.is_ascii_alphanumeric()) {
        format!("x{}", &sanitized[1..])
    } else {
        sanitized
    }
}

/// FNV-1a 32-bit hash, stable across Rust versions and platforms.
fn fnv1a_32(data: &[u8]) -> u32 {
    const FNV_OFFSET: u32 = 2_166_136_261;
    const FNV_PRIME: u32 = 16_777_619;
    let mut hash = FNV_OFFSET;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
