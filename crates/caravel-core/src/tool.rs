//! Tool abstraction module
//!
//! This module defines the uniform interface over external capabilities:
//! - ToolName: closed enumeration of known tools (the dispatch boundary)
//! - ToolAdapter: one adapter per provider protocol
//! - ToolResult: normalized tool output
//! - ToolError: everything that can go wrong during a dispatch
//! - ToolRegistry: name-based adapter lookup

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Closed enumeration of known tool capabilities.
///
/// Plans carry open strings; this is where they become typed. An unparseable
/// name is reported by the registry as `ToolError::UnknownTool`, which makes
/// it a dispatch failure rather than a planning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Synchronous web search
    TavilySearch,
    /// Simple extraction: submit a job, wait a fixed delay, fetch once
    BrowseaiScrape,
    /// Complex extraction: submit a job, poll status until terminal
    ApifyScrape,
}

impl ToolName {
    /// Parse a plan-provided tool name by exact match
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "tavily_search" => Some(Self::TavilySearch),
            "browseai_scrape" => Some(Self::BrowseaiScrape),
            "apify_scrape" => Some(Self::ApifyScrape),
            _ => None,
        }
    }

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TavilySearch => "tavily_search",
            Self::BrowseaiScrape => "browseai_scrape",
            Self::ApifyScrape => "apify_scrape",
        }
    }

    /// Whether this tool denotes a scraping capability.
    ///
    /// Gates ScrapedData creation; a search step never produces ScrapedData
    /// even when its output happens to contain a `data` field.
    pub fn is_scrape(&self) -> bool {
        matches!(self, Self::BrowseaiScrape | Self::ApifyScrape)
    }

    /// All known tool names, for planner prompts and diagnostics
    pub fn all() -> [ToolName; 3] {
        [Self::TavilySearch, Self::BrowseaiScrape, Self::ApifyScrape]
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized tool output.
///
/// `data`, `metadata` and `error` are the uniform fields the orchestrator
/// inspects; everything else a provider returned is preserved in `extra` so
/// the summarizer sees the full payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Scrape payload, when the provider reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Provider metadata, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Provider-reported error text, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Remaining provider fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolResult {
    /// Build a result from a raw provider payload.
    ///
    /// Pulls the uniform fields out of an object payload; a `data: null` is
    /// treated as absent. Non-object payloads land in `data` wholesale.
    pub fn from_payload(payload: Value) -> Self {
        match payload {
            Value::Object(mut map) => {
                let data = map.remove("data").filter(|v| !v.is_null());
                let metadata = map.remove("metadata").filter(|v| !v.is_null());
                let error = match map.remove("error") {
                    Some(Value::String(text)) => Some(text),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                };
                Self {
                    data,
                    metadata,
                    error,
                    extra: map,
                }
            }
            Value::Null => Self::default(),
            other => Self {
                data: Some(other),
                ..Self::default()
            },
        }
    }

    /// Whether the result carries a data payload
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// Tool dispatch errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid tool input: {0}")]
    InvalidInput(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Response(String),

    #[error("job ended {status}")]
    JobFailed { status: String },

    #[error("job still running after {attempts} status checks")]
    PollBudgetExhausted { attempts: u32 },
}

/// ToolAdapter trait - uniform interface over one external capability
///
/// Adapters normalize a provider's request/response or submit/poll protocol
/// into a single call that either yields a `ToolResult` or a `ToolError`.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Which capability this adapter implements
    fn name(&self) -> ToolName;

    /// Execute one tool invocation with the plan-provided input
    async fn execute(&self, input: &Value) -> Result<ToolResult, ToolError>;
}

/// Registry resolving plan tool names to adapters.
#[derive(Default)]
pub struct ToolRegistry {
    adapters: HashMap<ToolName, Arc<dyn ToolAdapter>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter under its own name
    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) {
        self.adapters.insert(adapter.name(), adapter);
    }

    /// Resolve a plan-provided tool name by exact match.
    ///
    /// Both an unparseable name and a parseable-but-unregistered one are
    /// `UnknownTool`: the plan was structurally valid, only its content
    /// referenced an unsupported capability.
    pub fn resolve(&self, raw: &str) -> Result<Arc<dyn ToolAdapter>, ToolError> {
        ToolName::parse(raw)
            .and_then(|name| self.adapters.get(&name).cloned())
            .ok_or_else(|| ToolError::UnknownTool(raw.to_string()))
    }

    /// Registered tool names
    pub fn names(&self) -> Vec<ToolName> {
        self.adapters.keys().copied().collect()
    }
}
