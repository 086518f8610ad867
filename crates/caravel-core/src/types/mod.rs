//! Core type definitions for Caravel
//!
//! This module contains the fundamental types used throughout the system:
//! - Task: One user-submitted unit of work and its terminal outcome
//! - Plan: Reasoning-service-generated execution plan
//! - ExecutionStep: Persisted record of one attempted tool invocation
//! - ScrapedData: Auxiliary artifact produced by successful scrape steps

mod plan;
mod step;
mod task;

pub use plan::{Plan, PlanStep};
pub use step::{ExecutionStep, ScrapedData, StepStatus};
pub use task::{Task, TaskId, TaskResult, TaskStatus};
