//! Production wiring: credentials in, a ready orchestrator out.

use std::sync::Arc;

use thiserror::Error;

use caravel_core::store::{ScrapedDataStore, StepStore, TaskStore};
use caravel_core::tool::{ToolError, ToolRegistry};
use caravel_reasoning::{
    LlmError, OpenRouterClient, OpenRouterConfig, PlanGenerator, PlanGeneratorConfig,
    SummaryGenerator, SummaryGeneratorConfig,
};
use caravel_stores::{
    BroadcastEventBus, InMemoryScrapedDataStore, InMemoryStepStore, InMemoryTaskStore,
};
use caravel_tools::{
    ApifyAdapter, ApifyConfig, BrowseaiAdapter, BrowseaiConfig, TavilyAdapter, TavilyConfig,
};

use crate::config::Credentials;
use crate::executor::StepExecutor;
use crate::orchestrator::TaskOrchestrator;

/// Errors building the runtime from credentials.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("tool client: {0}")]
    Tool(#[from] ToolError),

    #[error("llm client: {0}")]
    Llm(#[from] LlmError),
}

/// Fully wired orchestration runtime.
///
/// The stores and bus are exposed so an embedding surface (the HTTP server)
/// can read task/step state and stream events without going through the
/// orchestrator.
pub struct Runtime {
    pub orchestrator: Arc<TaskOrchestrator>,
    pub tasks: Arc<dyn TaskStore>,
    pub steps: Arc<dyn StepStore>,
    pub scraped_data: Arc<dyn ScrapedDataStore>,
    pub bus: Arc<BroadcastEventBus>,
}

impl Runtime {
    /// Wire the in-memory stores, real provider adapters, and the OpenRouter
    /// reasoning clients into one orchestrator.
    pub fn from_credentials(credentials: Credentials) -> Result<Self, BuildError> {
        let tasks: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
        let steps: Arc<dyn StepStore> = Arc::new(InMemoryStepStore::new());
        let scraped_data: Arc<dyn ScrapedDataStore> = Arc::new(InMemoryScrapedDataStore::new());
        let bus = Arc::new(BroadcastEventBus::default());

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(TavilyAdapter::new(TavilyConfig {
            api_key: credentials.tavily_api_key.clone(),
            ..TavilyConfig::default()
        })?));
        registry.register(Arc::new(BrowseaiAdapter::new(BrowseaiConfig {
            api_key: credentials.browseai_api_key.clone(),
            ..BrowseaiConfig::default()
        })?));
        registry.register(Arc::new(ApifyAdapter::new(ApifyConfig {
            api_key: credentials.apify_api_key.clone(),
            ..ApifyConfig::default()
        })?));

        let llm_config = OpenRouterConfig {
            api_key: Some(credentials.openrouter_api_key.clone()),
            ..OpenRouterConfig::default()
        };
        let planner = PlanGenerator::new(
            OpenRouterClient::new(llm_config.clone())?,
            PlanGeneratorConfig::default(),
        );
        let summarizer = SummaryGenerator::new(
            OpenRouterClient::new(llm_config)?,
            SummaryGeneratorConfig::default(),
        );

        let executor = Arc::new(StepExecutor::new(
            registry,
            steps.clone(),
            scraped_data.clone(),
            bus.clone(),
        ));
        let orchestrator = Arc::new(TaskOrchestrator::new(
            Arc::new(planner),
            Arc::new(summarizer),
            executor,
            tasks.clone(),
            bus.clone(),
        ));

        Ok(Self {
            orchestrator,
            tasks,
            steps,
            scraped_data,
            bus,
        })
    }
}
