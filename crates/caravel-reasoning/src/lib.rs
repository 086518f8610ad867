//! # Caravel Reasoning
//!
//! Clients for the external reasoning service and the two components built
//! on it: the plan generator and the summary generator. Both consume the same
//! `LlmClient` abstraction, so tests can substitute a mock and the runtime
//! can point both at one OpenRouter client.

mod llm;
mod plan;
mod summary;

pub use llm::{LlmClient, LlmError, LlmRequest, MockLlmClient, OpenRouterClient, OpenRouterConfig};
pub use plan::{PlanGenerator, PlanGeneratorConfig};
pub use summary::{SummaryGenerator, SummaryGeneratorConfig};

/// Default model routed through OpenRouter for planning and summarization.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-0528:free";
