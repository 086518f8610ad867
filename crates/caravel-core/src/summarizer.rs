//! Summarizer abstraction
//!
//! Turns the accumulated step outputs back into one natural-language artifact
//! via a second external reasoning call. A summarizer failure fails the task
//! even when every step already succeeded.

use async_trait::async_trait;
use thiserror::Error;

use crate::tool::ToolResult;

/// Summarizer errors
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Transport/HTTP failure reaching the reasoning service
    #[error("http error: {0}")]
    Http(String),

    /// Malformed response envelope
    #[error("response error: {0}")]
    Response(String),

    /// The service returned no content
    #[error("summary content was empty")]
    EmptyContent,
}

/// Summarizer trait - synthesizes the final result text
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Combine the original intent and the ordered step results into free text
    async fn summarize(
        &self,
        user_input: &str,
        results: &[ToolResult],
    ) -> Result<String, SummaryError>;
}
