//! Summary synthesis over executed step results.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use caravel_core::summarizer::{Summarizer, SummaryError};
use caravel_core::tool::ToolResult;

use crate::llm::{LlmClient, LlmError, LlmRequest};
use crate::DEFAULT_MODEL;

const SUMMARIZER_SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant. Summarize the results of the executed tasks \
in a clear, concise way for the user.";

/// Summary generator config
#[derive(Debug, Clone)]
pub struct SummaryGeneratorConfig {
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for SummaryGeneratorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            system_prompt: SUMMARIZER_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// LLM-backed summary generator
pub struct SummaryGenerator<C: LlmClient> {
    client: C,
    config: SummaryGeneratorConfig,
}

impl<C: LlmClient> SummaryGenerator<C> {
    pub fn new(client: C, config: SummaryGeneratorConfig) -> Self {
        Self { client, config }
    }
}

fn map_llm_error(error: LlmError) -> SummaryError {
    match error {
        LlmError::Http(message) => SummaryError::Http(message),
        LlmError::Response(message) | LlmError::Serialization(message) => {
            SummaryError::Response(message)
        }
    }
}

/// Render the user-facing prompt carrying the original request plus every
/// step's output as pretty-printed JSON.
fn render_prompt(user_input: &str, results: &[ToolResult]) -> String {
    let payload: Vec<Value> =
        results
            .iter()
            .map(|r| serde_json::to_value(r).unwrap_or(Value::Null))
            .collect();
    let rendered = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "[]".to_string());
    format!(
        "User requested: {}\n\nResults from execution:\n{}\n\nProvide a clear summary of what was accomplished.",
        user_input, rendered
    )
}

#[async_trait]
impl<C: LlmClient> Summarizer for SummaryGenerator<C> {
    async fn summarize(
        &self,
        user_input: &str,
        results: &[ToolResult],
    ) -> Result<String, SummaryError> {
        let request = LlmRequest {
            system: self.config.system_prompt.clone(),
            user: render_prompt(user_input, results),
            model: self.config.model.clone(),
            temperature: self.config.temperature,
        };
        info!(
            model = %self.config.model,
            result_count = results.len(),
            "summary requested"
        );

        let output = self.client.complete(request).await.map_err(map_llm_error)?;
        let summary = output.trim();
        if summary.is_empty() {
            return Err(SummaryError::EmptyContent);
        }
        Ok(summary.to_string())
    }
}
