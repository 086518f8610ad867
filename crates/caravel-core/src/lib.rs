//! # Caravel Core
//!
//! Core abstractions and deterministic logic for the Caravel task orchestrator.
//!
//! This crate contains:
//! - Task / Plan / ExecutionStep / ScrapedData definitions
//! - ToolAdapter / Planner / Summarizer abstractions
//! - The job poll state machine used by async tool adapters
//! - Store traits for task, step and scraped-data persistence
//!
//! This crate does NOT care about:
//! - Which providers back the tools
//! - How tasks are submitted or observed
//! - Where persisted records actually live

pub mod planner;
pub mod poll;
pub mod store;
pub mod summarizer;
pub mod tool;
pub mod types;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::planner::{PlanError, Planner};
    pub use crate::poll::{JobPoller, JobStatus, PollOutcome, Sleeper, TokioSleeper};
    pub use crate::store::{ScrapedDataStore, StepStore, StoreError, TaskStore};
    pub use crate::summarizer::{Summarizer, SummaryError};
    pub use crate::tool::{ToolAdapter, ToolError, ToolName, ToolRegistry, ToolResult};
    pub use crate::types::{
        ExecutionStep, Plan, PlanStep, ScrapedData, StepStatus, Task, TaskId, TaskResult,
        TaskStatus,
    };
}

// Re-export key types at crate root
pub use planner::{PlanError, Planner};
pub use poll::{JobPoller, JobStatus, PollOutcome, Sleeper, TokioSleeper};
pub use store::{ScrapedDataStore, StepStore, StoreError, TaskStore};
pub use summarizer::{Summarizer, SummaryError};
pub use tool::{ToolAdapter, ToolError, ToolName, ToolRegistry, ToolResult};
pub use types::{
    ExecutionStep, Plan, PlanStep, ScrapedData, StepStatus, Task, TaskId, TaskResult, TaskStatus,
};
