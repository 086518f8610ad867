//! Browse.ai extraction adapter.
//!
//! Submit-then-fixed-delay completion model: create a robot task, wait one
//! fixed interval, fetch the result once. The single fetch is authoritative;
//! there is no retry on a premature result. This models "fire, wait, collect"
//! tools with short, predictable completion times.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use caravel_core::poll::{Sleeper, TokioSleeper};
use caravel_core::tool::{ToolAdapter, ToolError, ToolName, ToolResult};

use crate::{truncate_body, MAX_ERROR_BODY_CHARS};

/// Browse.ai client configuration.
#[derive(Debug, Clone)]
pub struct BrowseaiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base endpoint URL.
    pub endpoint: String,
    /// Fixed delay between job submission and the single result fetch.
    pub collect_delay: Duration,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BrowseaiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.browse.ai/v2".to_string(),
            collect_delay: Duration::from_secs(5),
            timeout_secs: 30,
        }
    }
}

/// Browse.ai extraction adapter.
pub struct BrowseaiAdapter {
    client: reqwest::Client,
    config: BrowseaiConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl BrowseaiAdapter {
    /// Create a new adapter with the tokio timer.
    pub fn new(config: BrowseaiConfig) -> Result<Self, ToolError> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    /// Create a new adapter with an injected sleeper (for tests).
    pub fn with_sleeper(
        config: BrowseaiConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolError::Http(e.to_string()))?;
        Ok(Self {
            client,
            config,
            sleeper,
        })
    }

    async fn read_error_body(response: reqwest::Response) -> ToolError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ToolError::Provider {
            status,
            body: truncate_body(&body, MAX_ERROR_BODY_CHARS),
        }
    }
}

/// Extract `(robot_id, parameters)` from plan-provided input.
fn parse_input(input: &Value) -> Result<(String, Value), ToolError> {
    let robot_id = input
        .get("robot_id")
        .and_then(|v| v.as_str())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            ToolError::InvalidInput("missing 'robot_id' for browseai_scrape".to_string())
        })?;
    let parameters = input.get("parameters").cloned().unwrap_or(Value::Null);
    Ok((robot_id.to_string(), parameters))
}

#[async_trait]
impl ToolAdapter for BrowseaiAdapter {
    fn name(&self) -> ToolName {
        ToolName::BrowseaiScrape
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult, ToolError> {
        let (robot_id, parameters) = parse_input(input)?;
        debug!(robot_id = %robot_id, "browseai task submission");

        let response = self
            .client
            .post(format!("{}/robots/{}/tasks", self.config.endpoint, robot_id))
            .bearer_auth(&self.config.api_key)
            .json(&json!({ "inputParameters": parameters }))
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error_body(response).await);
        }

        let submission: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Response(e.to_string()))?;
        let job_id = submission
            .pointer("/result/id")
            .and_then(|v| v.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| {
                ToolError::Response("submission response carried no task id".to_string())
            })?;
        info!(robot_id = %robot_id, job_id = %job_id, "browseai task created, waiting for completion");

        self.sleeper.sleep(self.config.collect_delay).await;

        let response = self
            .client
            .get(format!(
                "{}/robots/{}/tasks/{}",
                self.config.endpoint, robot_id, job_id
            ))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error_body(response).await);
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Response(e.to_string()))?;
        info!(robot_id = %robot_id, job_id = %job_id, "browseai task collected");

        Ok(ToolResult::from_payload(payload))
    }
}
