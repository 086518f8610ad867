//! ExecutionStep and ScrapedData type definitions
//!
//! An ExecutionStep is the persisted record of one attempted tool invocation
//! within a task. It is created in `Executing` immediately before dispatch and
//! updated exactly once to a terminal status immediately after.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool::ToolResult;
use crate::types::TaskId;

/// Step sub-state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Dispatched to the tool adapter, outcome not yet known
    Executing,
    /// Tool call succeeded; `tool_output` is set
    Completed,
    /// Tool call failed; `error` is set
    Failed,
}

impl StepStatus {
    /// Check if the step reached a terminal sub-state
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

/// Persisted record of one attempted plan step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Owning task
    pub task_id: TaskId,
    /// 1-based position in plan order; not a retry counter
    pub step_number: u32,
    /// Tool name copied verbatim from the plan step
    pub tool_name: String,
    /// Tool input copied verbatim from the plan step
    pub tool_input: Value,
    /// Set only on success
    #[serde(default)]
    pub tool_output: Option<ToolResult>,
    /// Current sub-state
    pub status: StepStatus,
    /// Set only on failure
    #[serde(default)]
    pub error: Option<String>,
    /// When the step was dispatched
    pub started_at: DateTime<Utc>,
    /// Set on either terminal sub-state
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExecutionStep {
    /// Create an in-flight step record, persisted before the tool call
    pub fn begin(
        task_id: impl Into<TaskId>,
        step_number: u32,
        tool_name: impl Into<String>,
        tool_input: Value,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            step_number,
            tool_name: tool_name.into(),
            tool_input,
            tool_output: None,
            status: StepStatus::Executing,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark the step completed with its output
    pub fn complete(&mut self, output: ToolResult) {
        self.tool_output = Some(output);
        self.status = StepStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the step failed with a normalized error message
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.status = StepStatus::Failed;
        self.completed_at = Some(Utc::now());
    }
}

/// Auxiliary artifact persisted when a scraping step yields a data payload.
///
/// Append-only side effect of successful scrape steps; it has no lifecycle of
/// its own beyond the step that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedData {
    /// Owning task
    pub task_id: TaskId,
    /// Source URL, taken from the plan step input when present
    #[serde(default)]
    pub url: Option<String>,
    /// The scraped payload
    pub data: Value,
    /// Provider metadata, when the tool reported any
    #[serde(default)]
    pub metadata: Option<Value>,
    /// When the record was appended
    pub created_at: DateTime<Utc>,
}

impl ScrapedData {
    /// Create a scraped-data record for a task
    pub fn new(
        task_id: impl Into<TaskId>,
        url: Option<String>,
        data: Value,
        metadata: Option<Value>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            url,
            data,
            metadata,
            created_at: Utc::now(),
        }
    }
}
