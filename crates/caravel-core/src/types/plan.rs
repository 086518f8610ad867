//! Plan type definitions
//!
//! A Plan is untyped external input produced by the reasoning service. Tool
//! names stay open strings here; they only become a closed enum at the
//! dispatch boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One planned tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Tool name as emitted by the planner (validated at dispatch, not here)
    pub tool: String,
    /// Structured arguments passed verbatim to the tool adapter
    #[serde(default)]
    pub input: Value,
    /// What this step is supposed to accomplish
    #[serde(default)]
    pub description: String,
}

/// Ordered execution plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Ordered steps; a structurally valid plan has at least one
    #[serde(default)]
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// Create a plan from steps
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    /// Number of planned steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// A plan with no steps is structurally invalid
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
