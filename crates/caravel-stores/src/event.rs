//! Event - lifecycle facts published while a task runs.
//!
//! Observers subscribe by task id and see every ExecutionStep insert/update
//! (carrying the full step record) followed by exactly one terminal task
//! update. This is how progress is surfaced without polling the task row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use caravel_core::types::{ExecutionStep, Task, TaskId};

/// A task lifecycle fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An ExecutionStep row was inserted or updated
    StepUpdate {
        /// Owning task
        task_id: TaskId,
        /// The full step record as persisted
        step: ExecutionStep,
        /// Event timestamp
        timestamp: DateTime<Utc>,
    },

    /// The task's own status changed
    TaskUpdate {
        /// Owning task
        task_id: TaskId,
        /// The task snapshot as persisted
        task: Task,
        /// Event timestamp
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// Create a step insert/update event
    pub fn step_update(step: ExecutionStep) -> Self {
        Self::StepUpdate {
            task_id: step.task_id.clone(),
            step,
            timestamp: Utc::now(),
        }
    }

    /// Create a task status change event
    pub fn task_update(task: Task) -> Self {
        Self::TaskUpdate {
            task_id: task.id.clone(),
            task,
            timestamp: Utc::now(),
        }
    }

    /// The task this event belongs to, for subscriber-side filtering
    pub fn task_id(&self) -> &str {
        match self {
            Self::StepUpdate { task_id, .. } | Self::TaskUpdate { task_id, .. } => task_id,
        }
    }
}
