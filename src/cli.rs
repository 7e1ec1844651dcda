use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "topo")]
#[command(version)]
#[command(about = "Bring up a service topology, wait for TCP readiness, run a command against it")]
pub struct Cli {
    /// Config file path (defaults to topology.yaml, searched upwards)
    #[arg(short, long, global = true, env = "TOPO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Working directory
    #[arg(short, long, global = true)]
    pub workdir: Option<PathBuf>,

    /// Services are provided by the environment; connect to them instead of
    /// starting containers
    #[arg(long, global = true, env = "TOPO_ATTACH")]
    pub attach: bool,

    /// Keep fixed host ports even for services that do not allow them
    #[arg(long, global = true)]
    pub preserve_ports: bool,

    /// Suppress status messages
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a workflow's services, wait for them, run its command, tear down
    Run {
        /// Workflow name
        #[arg(default_value = "default")]
        workflow: String,

        /// Leave the services running after the command exits
        #[arg(long)]
        keep: bool,

        /// Arguments appended to the workflow command (after --)
        #[arg(last = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Start services and wait until they accept connections
    Up {
        /// Services to start (defaults to all)
        services: Vec<String>,
    },
    /// Stop and remove services
    Down {
        /// Services to stop (defaults to all)
        services: Vec<String>,
    },
    /// Print the host port of a running service
    Port {
        /// Service name
        service: String,

        /// Print host:port instead of the port alone
        #[arg(long)]
        address: bool,
    },
    /// List the services of the topology
    Services {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what a workflow would start and run, without starting anything
    Plan {
        /// Workflow name
        #[arg(default_value = "default")]
        workflow: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration file
    Validate,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_to_default_workflow() {
        let cli = Cli::try_parse_from(["topo", "run"]).unwrap();
        match cli.command {
            Commands::Run { workflow, keep, args } => {
                assert_eq!(workflow, "default");
                assert!(!keep);
                assert!(args.is_empty());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_takes_trailing_args() {
        let cli = Cli::try_parse_from(["topo", "--attach", "run", "ci", "--", "-p", "storage"])
            .unwrap();
        assert!(cli.attach);
        match cli.command {
            Commands::Run { workflow, args, .. } => {
                assert_eq!(workflow, "ci");
                assert_eq!(args, vec!["-p", "storage"]);
            }
            _ => panic!("expected run"),
        }
    }
}
