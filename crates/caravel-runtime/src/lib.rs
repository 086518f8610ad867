//! # Caravel Runtime
//!
//! Assembles the core abstractions into a running orchestration engine:
//! credentials, the step executor, the task state machine, and the wiring
//! that connects real provider adapters and reasoning clients to the stores
//! and the event bus.

mod config;
mod executor;
mod orchestrator;
mod wiring;

pub use config::{ConfigError, Credentials};
pub use executor::{StepError, StepExecutor};
pub use orchestrator::{OrchestratorError, TaskOrchestrator};
pub use wiring::{BuildError, Runtime};
