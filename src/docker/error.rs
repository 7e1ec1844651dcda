use std::time::Duration;
use thiserror::Error;

/// Structured error type for Docker CLI operations.
#[derive(Error, Debug)]
pub enum DockerError {
    /// Docker command timed out.
    #[error("Timed out running '{command}' (exceeded {} seconds)", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    /// Docker command ran but returned non-zero exit.
    #[error("'{command}' failed{}: {stderr}", .exit_code.map(|c| format!(" (exit code {})", c)).unwrap_or_default())]
    CommandFailed {
        command: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    /// Docker binary couldn't be executed (not in PATH, permission denied).
    #[error("Failed to execute '{command}': {source}")]
    ExecFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Command succeeded but its output could not be interpreted.
    #[error("Unexpected output from '{command}': {detail}")]
    UnexpectedOutput { command: String, detail: String },
}

impl DockerError {
    pub fn timeout(cmd: impl Into<String>, dur: Duration) -> Self {
        DockerError::Timeout {
            command: cmd.into(),
            timeout: dur,
        }
    }

    /// Create a command-failed error from an `std::process::Output`.
    pub fn failed(cmd: impl Into<String>, output: &std::process::Output) -> Self {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        DockerError::CommandFailed {
            command: cmd.into(),
            stderr,
            exit_code: output.status.code(),
        }
    }

    pub fn exec_failed(cmd: impl Into<String>, err: std::io::Error) -> Self {
        DockerError::ExecFailed {
            command: cmd.into(),
            source: err,
        }
    }

    pub fn unexpected(cmd: impl Into<String>, detail: impl Into<String>) -> Self {
        DockerError::UnexpectedOutput {
            command: cmd.into(),
            detail: detail.into(),
        }
    }
}
