//! Plan generation against the reasoning service.
//!
//! One request with a fixed system instruction enumerating the available
//! tools and the required output shape; the textual response is parsed into
//! a `Plan`. Each failure condition surfaces as a distinct `PlanError` kind,
//! none retriable at this layer.

use async_trait::async_trait;
use tracing::{debug, info};

use caravel_core::planner::{PlanError, Planner};
use caravel_core::types::Plan;

use crate::llm::{extract_json, LlmClient, LlmError, LlmRequest};
use crate::DEFAULT_MODEL;

const PLANNER_SYSTEM_PROMPT: &str = "\
You are an AI task planner. Break down user requests into executable steps using these tools:
- tavily_search: For finding information online
- browseai_scrape: For simple data extraction (tables, prices, emails)
- apify_scrape: For complex scraping with navigation and login

Respond with a JSON object: { \"steps\": [{ \"tool\": \"tool_name\", \"input\": {...}, \"description\": \"what this step does\" }] }";

const MAX_OUTPUT_LOG_CHARS: usize = 8_000;

/// Plan generator config
#[derive(Debug, Clone)]
pub struct PlanGeneratorConfig {
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for PlanGeneratorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            system_prompt: PLANNER_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// LLM-backed plan generator
pub struct PlanGenerator<C: LlmClient> {
    client: C,
    config: PlanGeneratorConfig,
}

impl<C: LlmClient> PlanGenerator<C> {
    pub fn new(client: C, config: PlanGeneratorConfig) -> Self {
        Self { client, config }
    }
}

fn map_llm_error(error: LlmError) -> PlanError {
    match error {
        LlmError::Http(message) => PlanError::Http(message),
        LlmError::Response(message) | LlmError::Serialization(message) => {
            PlanError::Response(message)
        }
    }
}

#[async_trait]
impl<C: LlmClient> Planner for PlanGenerator<C> {
    async fn plan(&self, user_input: &str) -> Result<Plan, PlanError> {
        let request = LlmRequest {
            system: self.config.system_prompt.clone(),
            user: user_input.to_string(),
            model: self.config.model.clone(),
            temperature: self.config.temperature,
        };
        info!(
            model = %self.config.model,
            input_len = user_input.len(),
            "plan generation requested"
        );

        let output = self.client.complete(request).await.map_err(map_llm_error)?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                output = %truncate_for_log(&output, MAX_OUTPUT_LOG_CHARS),
                "planner raw output"
            );
        }

        let json_str = extract_json(&output).ok_or_else(|| {
            PlanError::Generation("planner output did not contain JSON".to_string())
        })?;
        let plan = serde_json::from_str::<Plan>(&json_str)
            .map_err(|e| PlanError::Generation(format!("invalid plan JSON: {}", e)))?;

        if plan.is_empty() {
            return Err(PlanError::EmptyPlan);
        }

        info!(step_count = plan.len(), "plan generated");
        Ok(plan)
    }
}

fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    struct FailingLlmClient;

    #[async_trait]
    impl LlmClient for FailingLlmClient {
        async fn complete(&self, _request: LlmRequest) -> Result<String, LlmError> {
            Err(LlmError::Http("connection refused".to_string()))
        }
    }

    fn generator(response: &str) -> PlanGenerator<MockLlmClient> {
        PlanGenerator::new(
            MockLlmClient {
                response: response.to_string(),
            },
            PlanGeneratorConfig::default(),
        )
    }

    #[test]
    fn test_plan_parses_from_fenced_output() {
        tokio_test::block_on(async {
            let planner = generator(
                "```json\n{\"steps\": [{\"tool\": \"tavily_search\", \"input\": {\"query\": \"rust\"}, \"description\": \"search\"}]}\n```",
            );
            let plan = planner.plan("find 3 articles about rust").await.unwrap();
            assert_eq!(plan.len(), 1);
            assert_eq!(plan.steps[0].tool, "tavily_search");
        });
    }

    #[test]
    fn test_unparseable_output_is_generation_error() {
        tokio_test::block_on(async {
            let planner = generator("I could not come up with a plan, sorry.");
            let err = planner.plan("do something").await.unwrap_err();
            assert!(matches!(err, PlanError::Generation(_)));
        });
    }

    #[test]
    fn test_object_without_steps_is_empty_plan_error() {
        tokio_test::block_on(async {
            let planner = generator("{\"notes\": \"no steps today\"}");
            let err = planner.plan("do something").await.unwrap_err();
            assert!(matches!(err, PlanError::EmptyPlan));
        });
    }

    #[test]
    fn test_transport_failure_is_http_error() {
        tokio_test::block_on(async {
            let planner = PlanGenerator::new(FailingLlmClient, PlanGeneratorConfig::default());
            let err = planner.plan("do something").await.unwrap_err();
            assert!(matches!(err, PlanError::Http(_)));
        });
    }
}
