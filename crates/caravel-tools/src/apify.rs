//! Apify extraction adapter.
//!
//! Submit-then-poll completion model: start an actor run, then drive the
//! poll state machine until the run settles or the attempt budget runs out.
//! Bounding both the interval and the attempt count gives a hard wall-clock
//! ceiling on a single step, which matters because the whole task blocks on
//! it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use caravel_core::poll::{JobPoller, JobStatus, PollOutcome, Sleeper, TokioSleeper};
use caravel_core::tool::{ToolAdapter, ToolError, ToolName, ToolResult};

use crate::{truncate_body, MAX_ERROR_BODY_CHARS};

/// Apify client configuration.
#[derive(Debug, Clone)]
pub struct ApifyConfig {
    /// API token for authentication.
    pub api_key: String,
    /// Base endpoint URL.
    pub endpoint: String,
    /// Delay between status checks.
    pub poll_interval: Duration,
    /// Maximum number of status checks before giving up locally.
    pub max_poll_attempts: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApifyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.apify.com/v2".to_string(),
            poll_interval: Duration::from_secs(3),
            max_poll_attempts: 60,
            timeout_secs: 30,
        }
    }
}

/// Apify extraction adapter.
pub struct ApifyAdapter {
    client: reqwest::Client,
    config: ApifyConfig,
    poller: JobPoller,
    sleeper: Arc<dyn Sleeper>,
}

impl ApifyAdapter {
    /// Create a new adapter with the tokio timer.
    pub fn new(config: ApifyConfig) -> Result<Self, ToolError> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    /// Create a new adapter with an injected sleeper (for tests).
    pub fn with_sleeper(config: ApifyConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolError::Http(e.to_string()))?;
        let poller = JobPoller::new(config.poll_interval, config.max_poll_attempts);
        Ok(Self {
            client,
            config,
            poller,
            sleeper,
        })
    }

    async fn get_json(&self, url: String) -> Result<Value, ToolError> {
        let response = self
            .client
            .get(url)
            .query(&[("token", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Provider {
                status: status.as_u16(),
                body: truncate_body(&body, MAX_ERROR_BODY_CHARS),
            });
        }
        response
            .json()
            .await
            .map_err(|e| ToolError::Response(e.to_string()))
    }

    async fn check_run_status(&self, actor_id: &str, run_id: &str) -> Result<JobStatus, ToolError> {
        let payload = self
            .get_json(format!(
                "{}/acts/{}/runs/{}",
                self.config.endpoint, actor_id, run_id
            ))
            .await?;
        let status = payload
            .pointer("/data/status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::Response("status payload carried no status".to_string()))?;
        let dataset_id = payload
            .pointer("/data/defaultDatasetId")
            .and_then(|v| v.as_str())
            .map(ToString::to_string);
        map_run_status(status, dataset_id)
    }

    async fn fetch_dataset(&self, dataset_id: &str) -> Result<Value, ToolError> {
        self.get_json(format!(
            "{}/datasets/{}/items",
            self.config.endpoint, dataset_id
        ))
        .await
    }
}

/// Map a provider status string to the poll state machine domain.
///
/// The provider spells its own timeout "TIMED-OUT"; that is a provider
/// verdict, kept distinct from local poll-budget exhaustion.
fn map_run_status(status: &str, dataset_id: Option<String>) -> Result<JobStatus, ToolError> {
    match status {
        "RUNNING" | "READY" => Ok(JobStatus::Running),
        "SUCCEEDED" => Ok(JobStatus::Succeeded {
            result_ref: dataset_id,
        }),
        "FAILED" => Ok(JobStatus::Failed),
        "ABORTED" => Ok(JobStatus::Aborted),
        "TIMED-OUT" => Ok(JobStatus::TimedOut),
        other => Err(ToolError::Response(format!(
            "unexpected run status '{}'",
            other
        ))),
    }
}

/// Extract `(actor_id, run_input)` from plan-provided input.
fn parse_input(input: &Value) -> Result<(String, Value), ToolError> {
    let actor_id = input
        .get("actor_id")
        .and_then(|v| v.as_str())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            ToolError::InvalidInput("missing 'actor_id' for apify_scrape".to_string())
        })?;
    let run_input = input.get("input").cloned().unwrap_or_else(|| json!({}));
    Ok((actor_id.to_string(), run_input))
}

fn result_from_dataset(items: Value) -> ToolResult {
    let mut extra = Map::new();
    extra.insert("status".to_string(), Value::String("SUCCEEDED".to_string()));
    ToolResult {
        data: Some(items),
        metadata: None,
        error: None,
        extra,
    }
}

#[async_trait]
impl ToolAdapter for ApifyAdapter {
    fn name(&self) -> ToolName {
        ToolName::ApifyScrape
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult, ToolError> {
        let (actor_id, run_input) = parse_input(input)?;
        debug!(actor_id = %actor_id, "apify run submission");

        let response = self
            .client
            .post(format!("{}/acts/{}/runs", self.config.endpoint, actor_id))
            .query(&[("token", self.config.api_key.as_str())])
            .json(&run_input)
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Provider {
                status: status.as_u16(),
                body: truncate_body(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let submission: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Response(e.to_string()))?;
        let run_id = submission
            .pointer("/data/id")
            .and_then(|v| v.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| {
                ToolError::Response("run submission carried no run id".to_string())
            })?;
        info!(actor_id = %actor_id, run_id = %run_id, "apify run started");

        let outcome = self
            .poller
            .run(self.sleeper.as_ref(), |attempt| {
                let actor_id = actor_id.clone();
                let run_id = run_id.clone();
                async move {
                    let status = self.check_run_status(&actor_id, &run_id).await?;
                    debug!(attempt, run_id = %run_id, ?status, "apify status check");
                    Ok::<_, ToolError>(status)
                }
            })
            .await?;

        match outcome {
            PollOutcome::Settled(JobStatus::Succeeded { result_ref }) => match result_ref {
                Some(dataset_id) => {
                    let items = self.fetch_dataset(&dataset_id).await?;
                    let item_count = items.as_array().map(|a| a.len()).unwrap_or(0);
                    info!(run_id = %run_id, item_count, "apify dataset fetched");
                    Ok(result_from_dataset(items))
                }
                None => {
                    // Success with no result set is an empty result, not an error.
                    warn!(run_id = %run_id, "apify run succeeded without a dataset id");
                    Ok(result_from_dataset(json!([])))
                }
            },
            PollOutcome::Settled(JobStatus::Failed) => Err(ToolError::JobFailed {
                status: "FAILED".to_string(),
            }),
            PollOutcome::Settled(JobStatus::Aborted) => Err(ToolError::JobFailed {
                status: "ABORTED".to_string(),
            }),
            PollOutcome::Settled(JobStatus::TimedOut) => Err(ToolError::JobFailed {
                status: "TIMED-OUT".to_string(),
            }),
            PollOutcome::Settled(JobStatus::Running) | PollOutcome::Exhausted { .. } => {
                let attempts = self.poller.max_attempts;
                Err(ToolError::PollBudgetExhausted { attempts })
            }
        }
    }
}
