use super::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File names searched for, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["topology.yaml", "topology.yml"];

pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Find config file starting from current directory
    pub fn find_config_file(&self) -> Result<PathBuf> {
        let current_dir = std::env::current_dir()?;
        Self::find_config_in_dir(&current_dir)
    }

    /// Look in `dir`, then each of its parents.
    pub fn find_config_in_dir(dir: &Path) -> Result<PathBuf> {
        for candidate in dir.ancestors() {
            for name in CONFIG_FILE_NAMES {
                let path = candidate.join(name);
                if path.is_file() {
                    return Ok(path);
                }
            }
        }

        Err(Error::Config(
            "Could not find topology.yaml in current directory or any parent".to_string(),
        ))
    }

    /// Load config from file path
    pub fn load_config<P: AsRef<Path>>(&self, path: P) -> Result<Config> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        self.parse_config(&content)
    }

    /// Parse config from YAML string
    pub fn parse_config(&self, content: &str) -> Result<Config> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::Parse(format!("Failed to parse YAML config: {}", e)))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
