//! # Caravel Tools
//!
//! One adapter per external capability, each normalizing a provider's
//! request/response or submit/poll protocol into the uniform `ToolAdapter`
//! contract:
//! - Tavily: synchronous search, one request/one response
//! - Browse.ai: submit a job, wait one fixed delay, fetch once
//! - Apify: submit a job, poll status on a bounded budget

mod apify;
mod browseai;
mod tavily;

pub use apify::{ApifyAdapter, ApifyConfig};
pub use browseai::{BrowseaiAdapter, BrowseaiConfig};
pub use tavily::{TavilyAdapter, TavilyConfig};

const MAX_ERROR_BODY_CHARS: usize = 2_000;

/// Cap provider error bodies before they land in error messages and logs.
pub(crate) fn truncate_body(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}
