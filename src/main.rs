mod cli;
mod commands;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use output::{CliOutput, QuietOutput, UserOutput};
use service_topology::{Error as TopoError, TopologyOptions, WorkflowError};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Exit code after SIGINT (128 + 2).
const INTERRUPTED_EXIT_CODE: i32 = 130;
/// Exit code after SIGTERM (128 + 15).
#[cfg(unix)]
const TERMINATED_EXIT_CODE: i32 = 143;

#[tokio::main]
async fn main() {
    let cancel = CancellationToken::new();
    let signal_exit_code = Arc::new(AtomicI32::new(INTERRUPTED_EXIT_CODE));

    if let Err(e) = run(cancel.clone(), signal_exit_code.clone()).await {
        if cancel.is_cancelled() {
            CliOutput.error("Interrupted");
            std::process::exit(signal_exit_code.load(Ordering::SeqCst));
        }

        // The command's own output is the user feedback; just propagate its code.
        if let Some(TopoError::Workflow(WorkflowError::UpstreamFailure(code))) =
            e.downcast_ref::<TopoError>()
        {
            std::process::exit(*code);
        }

        // All other errors: print with suggestions
        if let Some(topo_error) = e.downcast_ref::<TopoError>() {
            CliOutput.error(&format!("Error: {}", topo_error));
            if let Some(suggestion) = topo_error.suggestion() {
                eprintln!("\nHint: {}", suggestion);
            }
        } else {
            CliOutput.error(&format!("Error: {:#}", e));
        }
        std::process::exit(1);
    }
}

async fn run(cancel: CancellationToken, signal_exit_code: Arc<AtomicI32>) -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;
    spawn_signal_handler(cancel.clone(), signal_exit_code);

    if let Some(dir) = &cli.workdir {
        std::env::set_current_dir(dir)?;
    }

    let out: &dyn UserOutput = if cli.quiet { &QuietOutput } else { &CliOutput };
    let options = TopologyOptions {
        preserve_ports: cli.preserve_ports,
    };

    // ── Commands that need no loaded topology ─────────────────────────
    match &cli.command {
        Commands::Validate => {
            return commands::run_validate(cli.config.clone(), options, out);
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let ctx = commands::Context::load(cli.config.clone(), options, cli.attach)?;

    match &cli.command {
        Commands::Run {
            workflow,
            keep,
            args,
        } => commands::run_workflow(&ctx, workflow, args, *keep, cancel, out).await,
        Commands::Up { services } => commands::run_up(&ctx, services, cancel, out).await,
        Commands::Down { services } => commands::run_down(&ctx, services, out).await,
        Commands::Port { service, address } => {
            commands::run_port(&ctx, service, *address, out).await
        }
        Commands::Services { json } => commands::run_services(&ctx, *json, out),
        Commands::Plan { workflow, json } => commands::run_plan(&ctx, workflow, *json, out),
        Commands::Validate | Commands::Completions { .. } => Ok(()),
    }
}

/// SIGINT and SIGTERM cancel the current phase; commands tear down what they
/// started. `exit_code` records which signal arrived.
#[cfg(unix)]
fn spawn_signal_handler(cancel: CancellationToken, exit_code: Arc<AtomicI32>) {
    use tokio::signal::unix::{signal, SignalKind};

    // Registered before spawning so an early signal is not missed.
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!("Failed to create SIGINT handler: {}", e);
            None
        }
    };
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!("Failed to create SIGTERM handler: {}", e);
            None
        }
    };

    tokio::spawn(async move {
        let code = tokio::select! {
            Some(()) = recv_signal(&mut sigint) => {
                tracing::warn!("Interrupt received, stopping");
                INTERRUPTED_EXIT_CODE
            }
            Some(()) = recv_signal(&mut sigterm) => {
                tracing::warn!("Termination requested, stopping");
                TERMINATED_EXIT_CODE
            }
            else => return,
        };
        exit_code.store(code, Ordering::SeqCst);
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn recv_signal(stream: &mut Option<tokio::signal::unix::Signal>) -> Option<()> {
    match stream {
        Some(s) => s.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(not(unix))]
fn spawn_signal_handler(cancel: CancellationToken, exit_code: Arc<AtomicI32>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping");
            exit_code.store(INTERRUPTED_EXIT_CODE, Ordering::SeqCst);
            cancel.cancel();
        }
    });
}

fn init_tracing() -> anyhow::Result<()> {
    // stderr keeps the workflow command's stdout clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
