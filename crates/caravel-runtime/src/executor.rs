//! StepExecutor - runs one plan step against the tool registry.
//!
//! The executor owns the step lifecycle contract: the `Executing` row is
//! persisted and published before dispatch, and the row is rewritten with a
//! terminal status no matter how the dispatch ends. A step row is never left
//! in `Executing`.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use caravel_core::store::{ScrapedDataStore, StepStore, StoreError};
use caravel_core::tool::{ToolName, ToolRegistry, ToolResult};
use caravel_core::types::{ExecutionStep, PlanStep, ScrapedData, TaskId};
use caravel_stores::{Event, EventBus};

/// Step execution errors.
///
/// `Failed` renders the exact message recorded on the task when this step
/// aborts it; `Store` is an infrastructure fault, not a step verdict.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("Step {step_number} ({tool_name}) failed: {message}")]
    Failed {
        step_number: u32,
        tool_name: String,
        message: String,
    },
}

/// Runs individual plan steps and persists their lifecycle.
pub struct StepExecutor {
    registry: ToolRegistry,
    steps: Arc<dyn StepStore>,
    scraped_data: Arc<dyn ScrapedDataStore>,
    bus: Arc<dyn EventBus>,
}

impl StepExecutor {
    pub fn new(
        registry: ToolRegistry,
        steps: Arc<dyn StepStore>,
        scraped_data: Arc<dyn ScrapedDataStore>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            registry,
            steps,
            scraped_data,
            bus,
        }
    }

    /// Execute one plan step.
    ///
    /// An unresolvable tool name is a step failure, not a planning failure:
    /// the plan was structurally valid, only its content referenced an
    /// unsupported capability.
    pub async fn run_step(
        &self,
        task_id: &TaskId,
        plan_step: &PlanStep,
        step_number: u32,
    ) -> Result<ExecutionStep, StepError> {
        let mut step = ExecutionStep::begin(
            task_id.clone(),
            step_number,
            plan_step.tool.clone(),
            plan_step.input.clone(),
        );
        self.persist(&step).await?;
        info!(task_id = %task_id, step_number, tool = %plan_step.tool, "step dispatched");

        let outcome = match self.registry.resolve(&plan_step.tool) {
            Ok(adapter) => adapter.execute(&plan_step.input).await,
            Err(error) => Err(error),
        };

        match outcome {
            Ok(output) => {
                self.record_scrape_artifact(task_id, plan_step, &output).await;
                step.complete(output);
                self.persist(&step).await?;
                info!(task_id = %task_id, step_number, tool = %plan_step.tool, "step completed");
                Ok(step)
            }
            Err(error) => {
                let message = error.to_string();
                step.fail(message.clone());
                self.persist(&step).await?;
                warn!(
                    task_id = %task_id,
                    step_number,
                    tool = %plan_step.tool,
                    error = %message,
                    "step failed"
                );
                Err(StepError::Failed {
                    step_number,
                    tool_name: plan_step.tool.clone(),
                    message,
                })
            }
        }
    }

    async fn persist(&self, step: &ExecutionStep) -> Result<(), StoreError> {
        self.steps.upsert(step).await?;
        if let Err(error) = self.bus.publish(Event::step_update(step.clone())).await {
            warn!(task_id = %step.task_id, step_number = step.step_number, %error, "step event dropped");
        }
        Ok(())
    }

    /// Append a ScrapedData record when a scraping step produced a payload.
    ///
    /// Secondary write: a failure here is logged and never fails the step.
    async fn record_scrape_artifact(
        &self,
        task_id: &TaskId,
        plan_step: &PlanStep,
        output: &ToolResult,
    ) {
        let is_scrape = ToolName::parse(&plan_step.tool)
            .map(|name| name.is_scrape())
            .unwrap_or(false);
        if !is_scrape || !output.has_data() {
            return;
        }

        let url = plan_step
            .input
            .get("url")
            .and_then(|v| v.as_str())
            .map(ToString::to_string);
        let record = ScrapedData::new(
            task_id.clone(),
            url,
            output.data.clone().unwrap_or(Value::Null),
            output.metadata.clone(),
        );
        if let Err(error) = self.scraped_data.append(&record).await {
            warn!(task_id = %task_id, tool = %plan_step.tool, %error, "scraped data write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use caravel_core::tool::{ToolAdapter, ToolError};
    use caravel_core::types::StepStatus;
    use caravel_stores::{BroadcastEventBus, InMemoryScrapedDataStore, InMemoryStepStore};

    struct PayloadAdapter {
        name: ToolName,
        payload: Value,
    }

    #[async_trait]
    impl ToolAdapter for PayloadAdapter {
        fn name(&self) -> ToolName {
            self.name
        }

        async fn execute(&self, _input: &Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::from_payload(self.payload.clone()))
        }
    }

    struct RefusingAdapter {
        name: ToolName,
    }

    #[async_trait]
    impl ToolAdapter for RefusingAdapter {
        fn name(&self) -> ToolName {
            self.name
        }

        async fn execute(&self, _input: &Value) -> Result<ToolResult, ToolError> {
            Err(ToolError::Provider {
                status: 500,
                body: "internal error".to_string(),
            })
        }
    }

    fn executor_with(
        adapters: Vec<Arc<dyn ToolAdapter>>,
    ) -> (StepExecutor, Arc<InMemoryStepStore>, Arc<InMemoryScrapedDataStore>) {
        let mut registry = ToolRegistry::new();
        for adapter in adapters {
            registry.register(adapter);
        }
        let steps = Arc::new(InMemoryStepStore::new());
        let scraped = Arc::new(InMemoryScrapedDataStore::new());
        let executor = StepExecutor::new(
            registry,
            steps.clone(),
            scraped.clone(),
            Arc::new(BroadcastEventBus::default()),
        );
        (executor, steps, scraped)
    }

    fn plan_step(tool: &str, input: Value) -> PlanStep {
        PlanStep {
            tool: tool.to_string(),
            input,
            description: String::new(),
        }
    }

    #[test]
    fn test_successful_step_persists_completed_row() {
        tokio_test::block_on(async {
            let (executor, steps, _) = executor_with(vec![Arc::new(PayloadAdapter {
                name: ToolName::TavilySearch,
                payload: json!({"answer": "rust is fast"}),
            })]);

            let task_id = "task-1".to_string();
            let step = executor
                .run_step(&task_id, &plan_step("tavily_search", json!({"query": "rust"})), 1)
                .await
                .unwrap();

            assert_eq!(step.status, StepStatus::Completed);
            let rows = steps.list_for_task(&task_id).await.unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].status, StepStatus::Completed);
            assert!(rows[0].tool_output.is_some());
        });
    }

    #[test]
    fn test_failed_step_persists_terminal_row_and_message() {
        tokio_test::block_on(async {
            let (executor, steps, _) = executor_with(vec![Arc::new(RefusingAdapter {
                name: ToolName::BrowseaiScrape,
            })]);

            let task_id = "task-1".to_string();
            let err = executor
                .run_step(&task_id, &plan_step("browseai_scrape", json!({"robot_id": "r"})), 2)
                .await
                .unwrap_err();

            assert_eq!(
                err.to_string(),
                "Step 2 (browseai_scrape) failed: provider returned HTTP 500: internal error"
            );
            let rows = steps.list_for_task(&task_id).await.unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].status, StepStatus::Failed);
            assert!(rows[0].error.is_some());
            assert!(rows[0].completed_at.is_some());
        });
    }

    #[test]
    fn test_unknown_tool_is_a_step_failure() {
        tokio_test::block_on(async {
            let (executor, steps, _) = executor_with(vec![]);

            let task_id = "task-1".to_string();
            let err = executor
                .run_step(&task_id, &plan_step("web_search", json!({})), 1)
                .await
                .unwrap_err();

            assert!(err.to_string().contains("unknown tool: web_search"));
            let rows = steps.list_for_task(&task_id).await.unwrap();
            assert_eq!(rows[0].status, StepStatus::Failed);
        });
    }

    #[test]
    fn test_scraped_data_appended_only_for_scrape_tools_with_data() {
        tokio_test::block_on(async {
            let (executor, _, scraped) = executor_with(vec![
                Arc::new(PayloadAdapter {
                    name: ToolName::TavilySearch,
                    // A search result with a data field must not create an artifact.
                    payload: json!({"data": [{"title": "a"}]}),
                }),
                Arc::new(PayloadAdapter {
                    name: ToolName::BrowseaiScrape,
                    payload: json!({"data": {"price": "9.99"}, "metadata": {"robot": "r-1"}}),
                }),
            ]);

            let task_id = "task-1".to_string();
            executor
                .run_step(&task_id, &plan_step("tavily_search", json!({"query": "q"})), 1)
                .await
                .unwrap();
            executor
                .run_step(
                    &task_id,
                    &plan_step("browseai_scrape", json!({"robot_id": "r-1", "url": "https://shop.test"})),
                    2,
                )
                .await
                .unwrap();

            let records = scraped.list_for_task(&task_id).await.unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].url.as_deref(), Some("https://shop.test"));
            assert_eq!(records[0].data, json!({"price": "9.99"}));
        });
    }

    #[test]
    fn test_scrape_without_data_payload_appends_nothing() {
        tokio_test::block_on(async {
            let (executor, _, scraped) = executor_with(vec![Arc::new(PayloadAdapter {
                name: ToolName::ApifyScrape,
                payload: json!({"status": "SUCCEEDED"}),
            })]);

            let task_id = "task-1".to_string();
            executor
                .run_step(&task_id, &plan_step("apify_scrape", json!({"actor_id": "a"})), 1)
                .await
                .unwrap();

            assert!(scraped.list_for_task(&task_id).await.unwrap().is_empty());
        });
    }
}
