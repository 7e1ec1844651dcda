use service_topology::docker::project_from_dir;
use service_topology::orchestrator::{AttachedOrchestrator, DockerOrchestrator};
use service_topology::{
    Config, ContainerOrchestrator, Parser as ConfigParser, ReadinessSettings, Topology,
    TopologyOptions, TopologyRunner,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a command needs once the config is loaded.
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    /// Directory holding the config file; relative workflow `cwd`s start here.
    pub base_dir: PathBuf,
    pub project: String,
    pub topology: Arc<Topology>,
    pub readiness: ReadinessSettings,
    pub orchestrator: Arc<dyn ContainerOrchestrator>,
}

impl Context {
    pub fn load(
        config_path: Option<PathBuf>,
        options: TopologyOptions,
        attach: bool,
    ) -> anyhow::Result<Self> {
        let parser = ConfigParser::new();
        let config_path = match config_path {
            Some(path) => path,
            None => parser.find_config_file()?,
        };
        let config = parser.load_config(&config_path)?;
        let base_dir = config_dir(&config_path);

        let project = config
            .project
            .clone()
            .unwrap_or_else(|| project_from_dir(&base_dir));
        let topology = Arc::new(Topology::from_config(&config, options)?);
        let readiness = config.readiness.settings()?;

        let orchestrator: Arc<dyn ContainerOrchestrator> = if attach {
            Arc::new(AttachedOrchestrator::new())
        } else {
            Arc::new(DockerOrchestrator::new(&project))
        };
        tracing::debug!(
            "Loaded {} ({} services, project '{}', {} orchestrator)",
            config_path.display(),
            topology.len(),
            project,
            orchestrator.name()
        );

        Ok(Self {
            config,
            config_path,
            base_dir,
            project,
            topology,
            readiness,
            orchestrator,
        })
    }

    pub fn runner(&self, cancel: CancellationToken) -> TopologyRunner {
        TopologyRunner::new(self.topology.clone(), self.orchestrator.clone())
            .with_readiness(self.readiness)
            .with_cancellation(cancel)
    }

    /// `names`, or every service of the topology when empty.
    pub fn services_or_all(&self, names: &[String]) -> Vec<String> {
        if names.is_empty() {
            self.topology.names().map(str::to_string).collect()
        } else {
            names.to_vec()
        }
    }
}

pub(super) fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
