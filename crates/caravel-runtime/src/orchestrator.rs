//! TaskOrchestrator - drives one task through its whole lifecycle.
//!
//! Strictly linear pipeline: plan, then each step in order, then summarize.
//! The first failure anywhere aborts the task; remaining steps are never
//! attempted. Every status change is persisted and then published, so
//! observers see step updates in step-number order followed by exactly one
//! terminal task update.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use caravel_core::planner::Planner;
use caravel_core::store::{StoreError, TaskStore};
use caravel_core::summarizer::Summarizer;
use caravel_core::types::{Task, TaskId, TaskResult};
use caravel_stores::{Event, EventBus};

use crate::executor::{StepError, StepExecutor};

/// Orchestration errors surfaced to the caller.
///
/// Provider and planning failures are task-scoped verdicts recorded on the
/// task row, not errors of the orchestration run itself; only infrastructure
/// faults land here.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Drives tasks from submission to a terminal state.
pub struct TaskOrchestrator {
    planner: Arc<dyn Planner>,
    summarizer: Arc<dyn Summarizer>,
    executor: Arc<StepExecutor>,
    tasks: Arc<dyn TaskStore>,
    bus: Arc<dyn EventBus>,
}

impl TaskOrchestrator {
    pub fn new(
        planner: Arc<dyn Planner>,
        summarizer: Arc<dyn Summarizer>,
        executor: Arc<StepExecutor>,
        tasks: Arc<dyn TaskStore>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            planner,
            summarizer,
            executor,
            tasks,
            bus,
        }
    }

    /// Create a pending task and orchestrate it as a detached unit of work.
    pub async fn submit(self: &Arc<Self>, description: &str) -> Result<TaskId, OrchestratorError> {
        let task = Task::new(description);
        let task_id = task.id.clone();
        self.tasks.save(&task).await?;
        self.publish(&task).await;
        info!(task_id = %task_id, "task submitted");

        let this = Arc::clone(self);
        let spawned_id = task_id.clone();
        tokio::spawn(async move {
            if let Err(err) = this.run_task(&spawned_id).await {
                error!(task_id = %spawned_id, error = %err, "orchestration aborted");
            }
        });

        Ok(task_id)
    }

    /// Run one task to a terminal state.
    ///
    /// Public so callers that want to drive orchestration synchronously can;
    /// `submit` uses it through a spawned task.
    pub async fn run_task(&self, task_id: &TaskId) -> Result<(), OrchestratorError> {
        let mut task = self
            .tasks
            .load(task_id)
            .await?
            .ok_or_else(|| OrchestratorError::UnknownTask(task_id.clone()))?;

        task.start_planning();
        self.save(&task).await?;

        let plan = match self.planner.plan(&task.description).await {
            Ok(plan) => plan,
            Err(err) => return self.fail(task, err.to_string()).await,
        };
        info!(task_id = %task_id, step_count = plan.len(), "plan ready");

        task.start_executing();
        self.save(&task).await?;

        let mut results = Vec::with_capacity(plan.len());
        for (index, plan_step) in plan.steps.iter().enumerate() {
            let step_number = (index + 1) as u32;
            match self.executor.run_step(task_id, plan_step, step_number).await {
                Ok(step) => {
                    if let Some(output) = step.tool_output {
                        results.push(output);
                    }
                }
                Err(StepError::Store(err)) => return Err(err.into()),
                Err(failure @ StepError::Failed { .. }) => {
                    return self.fail(task, failure.to_string()).await;
                }
            }
        }

        let summary = match self.summarizer.summarize(&task.description, &results).await {
            Ok(summary) => summary,
            Err(err) => return self.fail(task, err.to_string()).await,
        };

        task.complete(TaskResult {
            summary,
            steps: results,
        });
        self.save(&task).await?;
        info!(task_id = %task_id, "task completed");
        Ok(())
    }

    async fn fail(&self, mut task: Task, message: String) -> Result<(), OrchestratorError> {
        warn!(task_id = %task.id, error = %message, "task failed");
        task.fail(message);
        self.save(&task).await
    }

    async fn save(&self, task: &Task) -> Result<(), OrchestratorError> {
        self.tasks.save(task).await?;
        self.publish(task).await;
        Ok(())
    }

    async fn publish(&self, task: &Task) {
        if let Err(err) = self.bus.publish(Event::task_update(task.clone())).await {
            warn!(task_id = %task.id, error = %err, "task event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::broadcast::error::TryRecvError;

    use caravel_core::planner::PlanError;
    use caravel_core::store::StepStore;
    use caravel_core::summarizer::SummaryError;
    use caravel_core::tool::{ToolAdapter, ToolError, ToolName, ToolRegistry, ToolResult};
    use caravel_core::types::{Plan, PlanStep, StepStatus, TaskStatus};
    use caravel_stores::{
        BroadcastEventBus, InMemoryScrapedDataStore, InMemoryStepStore, InMemoryTaskStore,
    };

    struct StaticPlanner {
        steps: Vec<PlanStep>,
    }

    #[async_trait]
    impl Planner for StaticPlanner {
        async fn plan(&self, _user_input: &str) -> Result<Plan, PlanError> {
            Ok(Plan {
                steps: self.steps.clone(),
            })
        }
    }

    struct BrokenPlanner;

    #[async_trait]
    impl Planner for BrokenPlanner {
        async fn plan(&self, _user_input: &str) -> Result<Plan, PlanError> {
            Err(PlanError::Generation(
                "planner output did not contain JSON".to_string(),
            ))
        }
    }

    struct StaticSummarizer;

    #[async_trait]
    impl Summarizer for StaticSummarizer {
        async fn summarize(
            &self,
            _user_input: &str,
            results: &[ToolResult],
        ) -> Result<String, SummaryError> {
            Ok(format!("summarized {} results", results.len()))
        }
    }

    struct BrokenSummarizer;

    #[async_trait]
    impl Summarizer for BrokenSummarizer {
        async fn summarize(
            &self,
            _user_input: &str,
            _results: &[ToolResult],
        ) -> Result<String, SummaryError> {
            Err(SummaryError::EmptyContent)
        }
    }

    struct FakeAdapter {
        name: ToolName,
        outcome: Result<Value, ToolError>,
    }

    #[async_trait]
    impl ToolAdapter for FakeAdapter {
        fn name(&self) -> ToolName {
            self.name
        }

        async fn execute(&self, _input: &Value) -> Result<ToolResult, ToolError> {
            match &self.outcome {
                Ok(payload) => Ok(ToolResult::from_payload(payload.clone())),
                Err(ToolError::Provider { status, body }) => Err(ToolError::Provider {
                    status: *status,
                    body: body.clone(),
                }),
                Err(ToolError::PollBudgetExhausted { attempts }) => {
                    Err(ToolError::PollBudgetExhausted {
                        attempts: *attempts,
                    })
                }
                Err(other) => Err(ToolError::Http(other.to_string())),
            }
        }
    }

    struct Harness {
        orchestrator: Arc<TaskOrchestrator>,
        tasks: Arc<InMemoryTaskStore>,
        steps: Arc<InMemoryStepStore>,
        bus: Arc<BroadcastEventBus>,
    }

    fn harness(
        planner: Arc<dyn Planner>,
        summarizer: Arc<dyn Summarizer>,
        adapters: Vec<Arc<dyn ToolAdapter>>,
    ) -> Harness {
        let tasks = Arc::new(InMemoryTaskStore::new());
        let steps = Arc::new(InMemoryStepStore::new());
        let scraped = Arc::new(InMemoryScrapedDataStore::new());
        let bus = Arc::new(BroadcastEventBus::new(256));

        let mut registry = ToolRegistry::new();
        for adapter in adapters {
            registry.register(adapter);
        }
        let executor = Arc::new(StepExecutor::new(
            registry,
            steps.clone(),
            scraped.clone(),
            bus.clone(),
        ));
        let orchestrator = Arc::new(TaskOrchestrator::new(
            planner,
            summarizer,
            executor,
            tasks.clone(),
            bus.clone(),
        ));
        Harness {
            orchestrator,
            tasks,
            steps,
            bus,
        }
    }

    fn search_step(query: &str) -> PlanStep {
        PlanStep {
            tool: "tavily_search".to_string(),
            input: json!({"query": query}),
            description: "search".to_string(),
        }
    }

    async fn submit_pending(h: &Harness, description: &str) -> TaskId {
        let task = Task::new(description);
        h.tasks.save(&task).await.unwrap();
        task.id
    }

    #[test]
    fn test_single_search_task_completes_with_summary() {
        tokio_test::block_on(async {
            let h = harness(
                Arc::new(StaticPlanner {
                    steps: vec![search_step("articles about rust")],
                }),
                Arc::new(StaticSummarizer),
                vec![Arc::new(FakeAdapter {
                    name: ToolName::TavilySearch,
                    outcome: Ok(json!({"answer": "three articles"})),
                })],
            );

            let task_id = submit_pending(&h, "find 3 articles about rust").await;
            h.orchestrator.run_task(&task_id).await.unwrap();

            let task = h.tasks.load(&task_id).await.unwrap().unwrap();
            match task.status {
                TaskStatus::Completed { result } => {
                    assert_eq!(result.summary, "summarized 1 results");
                    assert_eq!(result.steps.len(), 1);
                }
                other => panic!("unexpected status: {:?}", other),
            }
            assert!(task.completed_at.is_some());

            let steps = h.steps.list_for_task(&task_id).await.unwrap();
            assert_eq!(steps.len(), 1);
            assert_eq!(steps[0].status, StepStatus::Completed);
        });
    }

    #[test]
    fn test_second_step_provider_failure_aborts_task() {
        tokio_test::block_on(async {
            let h = harness(
                Arc::new(StaticPlanner {
                    steps: vec![
                        search_step("find product page"),
                        PlanStep {
                            tool: "browseai_scrape".to_string(),
                            input: json!({"robot_id": "r-1"}),
                            description: "scrape it".to_string(),
                        },
                        search_step("never reached"),
                    ],
                }),
                Arc::new(StaticSummarizer),
                vec![
                    Arc::new(FakeAdapter {
                        name: ToolName::TavilySearch,
                        outcome: Ok(json!({"answer": "found"})),
                    }),
                    Arc::new(FakeAdapter {
                        name: ToolName::BrowseaiScrape,
                        outcome: Err(ToolError::Provider {
                            status: 500,
                            body: "robot exploded".to_string(),
                        }),
                    }),
                ],
            );

            let task_id = submit_pending(&h, "scrape prices").await;
            h.orchestrator.run_task(&task_id).await.unwrap();

            let task = h.tasks.load(&task_id).await.unwrap().unwrap();
            match task.status {
                TaskStatus::Failed { error } => {
                    assert!(error.starts_with("Step 2 (browseai_scrape) failed:"));
                    assert!(error.contains("500"));
                }
                other => panic!("unexpected status: {:?}", other),
            }

            // Strict prefix of the plan: the third step was never attempted.
            let steps = h.steps.list_for_task(&task_id).await.unwrap();
            assert_eq!(steps.len(), 2);
            assert_eq!(steps[0].status, StepStatus::Completed);
            assert_eq!(steps[1].status, StepStatus::Failed);
        });
    }

    #[test]
    fn test_poll_budget_exhaustion_is_distinct_from_provider_timeout() {
        tokio_test::block_on(async {
            let h = harness(
                Arc::new(StaticPlanner {
                    steps: vec![PlanStep {
                        tool: "apify_scrape".to_string(),
                        input: json!({"actor_id": "a-1"}),
                        description: "deep scrape".to_string(),
                    }],
                }),
                Arc::new(StaticSummarizer),
                vec![Arc::new(FakeAdapter {
                    name: ToolName::ApifyScrape,
                    outcome: Err(ToolError::PollBudgetExhausted { attempts: 60 }),
                })],
            );

            let task_id = submit_pending(&h, "scrape the catalog").await;
            h.orchestrator.run_task(&task_id).await.unwrap();

            let task = h.tasks.load(&task_id).await.unwrap().unwrap();
            match task.status {
                TaskStatus::Failed { error } => {
                    assert!(error.contains("still running after 60 status checks"));
                    assert!(!error.contains("TIMED-OUT"));
                }
                other => panic!("unexpected status: {:?}", other),
            }
        });
    }

    #[test]
    fn test_unparseable_plan_fails_before_executing() {
        tokio_test::block_on(async {
            let h = harness(Arc::new(BrokenPlanner), Arc::new(StaticSummarizer), vec![]);

            let task_id = submit_pending(&h, "do something vague").await;
            h.orchestrator.run_task(&task_id).await.unwrap();

            let task = h.tasks.load(&task_id).await.unwrap().unwrap();
            match task.status {
                TaskStatus::Failed { error } => {
                    assert!(error.contains("did not contain JSON"));
                }
                other => panic!("unexpected status: {:?}", other),
            }
            assert!(h.steps.list_for_task(&task_id).await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_summarizer_failure_fails_task_after_successful_steps() {
        tokio_test::block_on(async {
            let h = harness(
                Arc::new(StaticPlanner {
                    steps: vec![search_step("anything")],
                }),
                Arc::new(BrokenSummarizer),
                vec![Arc::new(FakeAdapter {
                    name: ToolName::TavilySearch,
                    outcome: Ok(json!({"answer": "ok"})),
                })],
            );

            let task_id = submit_pending(&h, "search something").await;
            h.orchestrator.run_task(&task_id).await.unwrap();

            let task = h.tasks.load(&task_id).await.unwrap().unwrap();
            assert!(matches!(task.status, TaskStatus::Failed { .. }));

            // Every step still completed; only the summary phase failed.
            let steps = h.steps.list_for_task(&task_id).await.unwrap();
            assert_eq!(steps[0].status, StepStatus::Completed);
        });
    }

    #[test]
    fn test_event_stream_is_gapless_and_ends_with_one_terminal_update() {
        tokio_test::block_on(async {
            let h = harness(
                Arc::new(StaticPlanner {
                    steps: vec![search_step("a"), search_step("b"), search_step("c")],
                }),
                Arc::new(StaticSummarizer),
                vec![Arc::new(FakeAdapter {
                    name: ToolName::TavilySearch,
                    outcome: Ok(json!({"answer": "x"})),
                })],
            );

            let mut rx = h.bus.subscribe();
            let task_id = submit_pending(&h, "triple search").await;
            h.orchestrator.run_task(&task_id).await.unwrap();

            let mut step_numbers = Vec::new();
            let mut terminal_updates = 0;
            loop {
                match rx.try_recv() {
                    Ok(Event::StepUpdate { step, .. }) => step_numbers.push(step.step_number),
                    Ok(Event::TaskUpdate { task, .. }) => {
                        if task.status.is_terminal() {
                            terminal_updates += 1;
                        }
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                    Err(TryRecvError::Lagged(_)) => continue,
                }
            }

            // Two updates per step (executing, then terminal), in order.
            assert_eq!(step_numbers, vec![1, 1, 2, 2, 3, 3]);
            assert_eq!(terminal_updates, 1);
        });
    }

    #[test]
    fn test_submit_creates_a_loadable_task() {
        tokio_test::block_on(async {
            let h = harness(
                Arc::new(StaticPlanner {
                    steps: vec![search_step("q")],
                }),
                Arc::new(StaticSummarizer),
                vec![Arc::new(FakeAdapter {
                    name: ToolName::TavilySearch,
                    outcome: Ok(json!({"answer": "x"})),
                })],
            );

            let task_id = h.orchestrator.submit("find things").await.unwrap();
            let task = h.tasks.load(&task_id).await.unwrap().unwrap();
            assert_eq!(task.description, "find things");
        });
    }

    #[test]
    fn test_run_task_on_unknown_id_is_an_error() {
        tokio_test::block_on(async {
            let h = harness(Arc::new(BrokenPlanner), Arc::new(StaticSummarizer), vec![]);
            let err = h
                .orchestrator
                .run_task(&"no-such-task".to_string())
                .await
                .unwrap_err();
            assert!(matches!(err, OrchestratorError::UnknownTask(_)));
        });
    }
}
