//! Tavily search adapter.
//!
//! Synchronous completion model: one POST, one response, result returned
//! immediately. A non-success status surfaces as a tool error with the
//! provider status code embedded.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use caravel_core::tool::{ToolAdapter, ToolError, ToolName, ToolResult};

use crate::{truncate_body, MAX_ERROR_BODY_CHARS};

const DEFAULT_MAX_RESULTS: u64 = 5;

/// Tavily client configuration.
#[derive(Debug, Clone)]
pub struct TavilyConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base endpoint URL.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.tavily.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    api_key: String,
    query: String,
    search_depth: &'static str,
    include_answer: bool,
    max_results: u64,
}

/// Tavily search adapter.
pub struct TavilyAdapter {
    client: reqwest::Client,
    config: TavilyConfig,
}

impl TavilyAdapter {
    /// Create a new adapter.
    pub fn new(config: TavilyConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }
}

/// Extract the search request from plan-provided input.
fn build_request(api_key: &str, input: &Value) -> Result<SearchRequest, ToolError> {
    let query = input
        .get("query")
        .and_then(|v| v.as_str())
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidInput("missing 'query' for tavily_search".to_string()))?;
    let max_results = input
        .get("max_results")
        .and_then(|v| v.as_u64())
        .unwrap_or(DEFAULT_MAX_RESULTS);

    Ok(SearchRequest {
        api_key: api_key.to_string(),
        query: query.to_string(),
        search_depth: "advanced",
        include_answer: true,
        max_results,
    })
}

#[async_trait]
impl ToolAdapter for TavilyAdapter {
    fn name(&self) -> ToolName {
        ToolName::TavilySearch
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult, ToolError> {
        let request = build_request(&self.config.api_key, input)?;
        debug!(query = %request.query, max_results = request.max_results, "tavily search dispatched");

        let response = self
            .client
            .post(format!("{}/search", self.config.endpoint))
            .json(&request)
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

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Response(e.to_string()))?;
        let result_count = payload
            .get("results")
            .and_then(|v| v.as_array())
            .map(|r| r.len())
            .unwrap_or(0);
        info!(query = %request.query, result_count, "tavily search completed");

        Ok(ToolResult::from_payload(payload))
    }
}
