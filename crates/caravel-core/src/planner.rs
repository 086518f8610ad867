//! Planner abstraction
//!
//! The Planner turns free-form user intent into an ordered step list via one
//! external reasoning call. It does NOT decide whether a tool name is
//! supported; that happens at dispatch.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Plan;

/// Planner errors, one kind per failure condition.
///
/// All are non-retriable at this layer; the caller decides whether to retry
/// the whole task.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Transport/HTTP failure reaching the reasoning service
    #[error("http error: {0}")]
    Http(String),

    /// Malformed response envelope (missing choices/content)
    #[error("response error: {0}")]
    Response(String),

    /// Response content was not parseable as a plan
    #[error("failed to generate plan: {0}")]
    Generation(String),

    /// Parsed structure had no steps
    #[error("plan contains no steps")]
    EmptyPlan,
}

/// Planner trait - generates execution plans from user intent
#[async_trait]
pub trait Planner: Send + Sync {
    /// Generate a plan from arbitrary non-empty user input
    async fn plan(&self, user_input: &str) -> Result<Plan, PlanError>;
}
