//! Execution of a planned workflow.
//!
//! `WorkflowExecutor` borrows the runner for one invocation; the runner's
//! `run_workflow` delegates here.

use super::{RunningService, TopologyRunner};
use crate::error::WorkflowError;
use crate::workflow::{overlay_env, WorkflowInvocation, WorkflowState, WorkflowTracker};
use serde::Serialize;
use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// What a successful workflow run did.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub workflow: String,
    pub exit_code: i32,
    pub services: Vec<RunningService>,
    pub elapsed: Duration,
    #[serde(skip)]
    pub states: Vec<WorkflowState>,
}

pub(super) struct WorkflowExecutor<'a> {
    runner: &'a TopologyRunner,
}

impl<'a> WorkflowExecutor<'a> {
    pub fn new(runner: &'a TopologyRunner) -> Self {
        Self { runner }
    }

    pub async fn run(
        &self,
        invocation: &WorkflowInvocation,
    ) -> Result<WorkflowReport, WorkflowError> {
        let started_at = Instant::now();
        let mut tracker = WorkflowTracker::new(&invocation.name);
        let result = self.run_tracked(invocation, &mut tracker).await;

        match result {
            Ok(services) => {
                let exit_code = match tracker.state() {
                    WorkflowState::Completed(code) => *code,
                    _ => 0,
                };
                if exit_code != 0 {
                    return Err(WorkflowError::UpstreamFailure(exit_code));
                }
                Ok(WorkflowReport {
                    workflow: invocation.name.clone(),
                    exit_code,
                    services,
                    elapsed: started_at.elapsed(),
                    states: tracker.history().to_vec(),
                })
            }
            Err(e) => {
                let reason = match &e {
                    WorkflowError::Cancelled => "cancelled".to_string(),
                    WorkflowError::Startup(crate::error::StartupError::Cancelled(_)) => {
                        "cancelled".to_string()
                    }
                    other => other.to_string(),
                };
                tracker.fail(reason);
                Err(e)
            }
        }
    }

    async fn run_tracked(
        &self,
        invocation: &WorkflowInvocation,
        tracker: &mut WorkflowTracker,
    ) -> Result<Vec<RunningService>, WorkflowError> {
        let runner = self.runner;

        tracker.advance(WorkflowState::StartingServices);
        let selected = runner.topology.select(invocation.services.as_slice())?;
        let running = runner.start_services(&selected).await?;

        tracker.advance(WorkflowState::WaitingForReadiness);
        runner.wait_for_readiness(&running).await?;

        let overlay = invocation.resolve_env(runner)?;
        for (key, value) in &overlay {
            tracing::debug!("{}={}", key, value);
        }
        let env = overlay_env(
            std::env::vars_os(),
            overlay
                .into_iter()
                .map(|(k, v)| (OsString::from(k), OsString::from(v))),
        );

        let program = invocation.program().to_string();
        let mut command = tokio::process::Command::new(&program);
        command
            .args(invocation.command.iter().skip(1))
            .env_clear()
            .envs(env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        tracker.advance(WorkflowState::Running);
        tracing::info!("Running: {}", invocation.display_command());
        let mut child = command
            .spawn()
            .map_err(|source| WorkflowError::SpawnFailure {
                program: program.clone(),
                source,
            })?;

        let status = tokio::select! {
            status = child.wait() => status.map_err(|source| WorkflowError::Wait {
                program: program.clone(),
                source,
            })?,
            _ = runner.cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    tracing::debug!("Killing '{}' failed: {}", program, e);
                }
                return Err(WorkflowError::Cancelled);
            }
        };

        let code = exit_code(&status);
        tracing::info!("'{}' exited with code {}", program, code);
        tracker.advance(WorkflowState::Completed(code));
        Ok(running)
    }
}

/// Exit code of a finished child. A signal death maps to `128 + signal`.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            match nix::sys::signal::Signal::try_from(signal) {
                Ok(sig) => tracing::warn!("Command terminated by {}", sig),
                Err(_) => tracing::warn!("Command terminated by signal {}", signal),
            }
            return 128 + signal;
        }
    }
    1
}
