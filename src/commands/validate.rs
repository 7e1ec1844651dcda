use super::context::config_dir;
use crate::output::UserOutput;
use service_topology::{Parser as ConfigParser, TopologyOptions};
use std::path::PathBuf;

pub fn run_validate(
    config_path: Option<PathBuf>,
    options: TopologyOptions,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let parser = ConfigParser::new();
    let config_path = match config_path {
        Some(path) => path,
        None => parser.find_config_file()?,
    };

    out.status(&format!("Validating {}...", config_path.display()));

    let config = parser.load_config(&config_path)?;
    config.validate(options, &config_dir(&config_path))?;

    out.success("Configuration is valid");
    out.data(&format!("Services: {}", config.services.len()));
    for service in &config.services {
        let origin = match (&service.preset, &service.image) {
            (_, Some(image)) => image.clone(),
            (Some(preset), None) => format!("preset {}", preset),
            (None, None) => "?".to_string(),
        };
        out.data(&format!("  - {} ({})", service.name, origin));
    }

    if !config.workflows.is_empty() {
        out.data(&format!("Workflows: {}", config.workflows.len()));
        for (name, workflow) in &config.workflows {
            match &workflow.description {
                Some(description) => out.data(&format!("  - {}: {}", name, description)),
                None => out.data(&format!("  - {}", name)),
            }
        }
    }
    Ok(())
}
