//! Store module
//!
//! Storage abstractions for the orchestrator's three record kinds:
//! - TaskStore: task rows, keyed by task id
//! - StepStore: execution step rows, ordered per task
//! - ScrapedDataStore: append-only scrape artifacts
//!
//! Note: implementations live in the caravel-stores crate.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ExecutionStep, ScrapedData, Task, TaskId};

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Task persistence. Tasks are mutated only by the orchestrator and never
/// deleted by the core; retention is an external concern.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert or replace a task row
    async fn save(&self, task: &Task) -> Result<(), StoreError>;

    /// Load a task by id
    async fn load(&self, task_id: &str) -> Result<Option<Task>, StoreError>;
}

/// Execution step persistence.
///
/// A step row is written once in `Executing` and rewritten exactly once with
/// its terminal status; `upsert` covers both writes, keyed by
/// `(task_id, step_number)`.
#[async_trait]
pub trait StepStore: Send + Sync {
    /// Insert or replace a step row
    async fn upsert(&self, step: &ExecutionStep) -> Result<(), StoreError>;

    /// All steps for a task, in step-number order
    async fn list_for_task(&self, task_id: &TaskId) -> Result<Vec<ExecutionStep>, StoreError>;
}

/// Append-only scrape artifact persistence.
#[async_trait]
pub trait ScrapedDataStore: Send + Sync {
    /// Append one artifact
    async fn append(&self, record: &ScrapedData) -> Result<(), StoreError>;

    /// All artifacts for a task, in append order
    async fn list_for_task(&self, task_id: &TaskId) -> Result<Vec<ScrapedData>, StoreError>;
}
