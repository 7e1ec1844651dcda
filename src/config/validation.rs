use super::Config;
use crate::error::{Error, Result};
use crate::topology::{Topology, TopologyOptions};
use crate::workflow::plan_workflow;
use std::path::Path;

impl Config {
    /// Validate the configuration.
    ///
    /// Resolves the topology, parses the readiness settings and plans every
    /// workflow, so anything `topo run` would reject before starting a
    /// container is reported here.
    pub fn validate(&self, options: TopologyOptions, base_dir: &Path) -> Result<()> {
        if let Some(project) = &self.project {
            if project.trim().is_empty() {
                return Err(Error::Validation("'project' must not be empty".to_string()));
            }
        }

        self.readiness.settings()?;

        let topology = Topology::from_config(self, options)?;
        for name in self.workflows.keys() {
            if name.trim().is_empty() {
                return Err(Error::Validation("Workflow with empty name".to_string()));
            }
            plan_workflow(self, &topology, name, base_dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Parser;
    use crate::error::Error;
    use crate::topology::TopologyOptions;
    use std::path::Path;

    fn validate(yaml: &str) -> crate::error::Result<()> {
        let config = Parser::new().parse_config(yaml)?;
        config.validate(TopologyOptions::default(), Path::new("."))
    }

    #[test]
    fn valid_config() {
        validate(
            r#"
services:
  - name: zookeeper
    preset: zookeeper
  - name: kafka
    preset: kafka
workflows:
  default:
    services: [zookeeper, kafka]
    command: [cargo, test]
    env:
      KAFKA_ADDRS: "{{host:kafka}}:{{port:kafka}}"
"#,
        )
        .unwrap();
    }

    #[test]
    fn zero_readiness_timeout_rejected() {
        let err = validate(
            r#"
readiness:
  timeout: 0s
services:
  - name: db
    preset: postgres
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("readiness.timeout"));
    }

    #[test]
    fn bad_duration_rejected() {
        assert!(validate(
            r#"
readiness:
  interval: soon
services: []
"#,
        )
        .is_err());
    }

    #[test]
    fn broken_workflow_fails_whole_config() {
        let err = validate(
            r#"
services:
  - name: db
    preset: postgres
workflows:
  ok:
    services: [db]
    command: ["true"]
  broken:
    services: [cache]
    command: ["true"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cache"));
    }

    #[test]
    fn empty_project_rejected() {
        assert!(validate("project: \"  \"\nservices: []\n").is_err());
    }
}
