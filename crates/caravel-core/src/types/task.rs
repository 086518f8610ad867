//! Task type definitions
//!
//! Task represents one user-submitted unit of work with its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::ToolResult;

/// Type alias for Task ID
pub type TaskId = String;

/// Final outcome of a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Natural-language summary produced by the summarizer
    pub summary: String,
    /// Ordered tool outputs, one per executed step
    pub steps: Vec<ToolResult>,
}

/// Task state machine.
///
/// The terminal variants carry their payload so a result can only exist on a
/// completed task and an error message only on a failed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, orchestration not started yet
    Pending,
    /// Currently generating a plan
    Planning,
    /// Currently executing plan steps
    Executing,
    /// Every planned step succeeded and a summary was produced
    Completed {
        /// Summary plus the ordered step outputs
        result: TaskResult,
    },
    /// Planning, a step, or summarization failed
    Failed {
        /// Human-readable failure message
        error: String,
    },
}

impl TaskStatus {
    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed { .. } | TaskStatus::Failed { .. })
    }

    /// Check if the task is actively being orchestrated
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Planning | TaskStatus::Executing)
    }

    /// Stable label for logging and wire payloads
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Planning => "planning",
            TaskStatus::Executing => "executing",
            TaskStatus::Completed { .. } => "completed",
            TaskStatus::Failed { .. } => "failed",
        }
    }
}

/// Task - one user-submitted unit of orchestrated work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, immutable after creation
    pub id: TaskId,
    /// Original user intent, free text
    pub description: String,
    /// Current state of the task
    pub status: TaskStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, on the terminal transition
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task from user input
    pub fn new(description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.into(),
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Update the task status.
    ///
    /// Terminal tasks are never mutated again; a transition attempt on one is
    /// ignored. `completed_at` is stamped on the first terminal transition.
    pub fn set_status(&mut self, status: TaskStatus) {
        if self.status.is_terminal() {
            return;
        }
        let now = Utc::now();
        if status.is_terminal() {
            self.completed_at = Some(now);
        }
        self.status = status;
        self.updated_at = now;
    }

    /// Transition to planning
    pub fn start_planning(&mut self) {
        self.set_status(TaskStatus::Planning);
    }

    /// Transition to executing
    pub fn start_executing(&mut self) {
        self.set_status(TaskStatus::Executing);
    }

    /// Transition to completed with the final result
    pub fn complete(&mut self, result: TaskResult) {
        self.set_status(TaskStatus::Completed { result });
    }

    /// Transition to failed
    pub fn fail(&mut self, error: impl Into<String>) {
        self.set_status(TaskStatus::Failed {
            error: error.into(),
        });
    }
}
