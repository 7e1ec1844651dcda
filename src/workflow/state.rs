//! Lifecycle of one workflow invocation.
//!
//! ```text
//! Idle → StartingServices → WaitingForReadiness → Running → Completed(code)
//!   └──────────┴──────────────────┴──────────────────┴────→ Failed(reason)
//! ```
//!
//! Single-shot: nothing loops back and the terminal states accept nothing.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    StartingServices,
    WaitingForReadiness,
    Running,
    Completed(i32),
    Failed(String),
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Completed(_) | WorkflowState::Failed(_))
    }

    pub fn can_transition_to(&self, next: &WorkflowState) -> bool {
        use WorkflowState::*;
        match (self, next) {
            (Idle, StartingServices)
            | (StartingServices, WaitingForReadiness)
            | (WaitingForReadiness, Running)
            | (Running, Completed(_)) => true,
            (current, Failed(_)) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Idle => write!(f, "idle"),
            WorkflowState::StartingServices => write!(f, "starting services"),
            WorkflowState::WaitingForReadiness => write!(f, "waiting for readiness"),
            WorkflowState::Running => write!(f, "running"),
            WorkflowState::Completed(code) => write!(f, "completed (exit code {})", code),
            WorkflowState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Records the states an invocation went through.
#[derive(Debug, Clone)]
pub struct WorkflowTracker {
    workflow: String,
    history: Vec<WorkflowState>,
}

impl WorkflowTracker {
    pub fn new(workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
            history: vec![WorkflowState::Idle],
        }
    }

    pub fn state(&self) -> &WorkflowState {
        // history starts with Idle and is never drained
        &self.history[self.history.len() - 1]
    }

    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    /// Move to `next`. Returns `false` and stays put on an illegal transition.
    pub fn advance(&mut self, next: WorkflowState) -> bool {
        if !self.state().can_transition_to(&next) {
            tracing::warn!(
                "Workflow '{}': ignoring transition {} -> {}",
                self.workflow,
                self.state(),
                next
            );
            return false;
        }
        tracing::debug!("Workflow '{}': {} -> {}", self.workflow, self.state(), next);
        self.history.push(next);
        true
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        self.advance(WorkflowState::Failed(reason.into()))
    }
}
