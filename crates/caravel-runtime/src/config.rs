//! Credential configuration.
//!
//! Every provider key is required up front. A missing key is a startup-time
//! fatal error that names every absent variable at once, so an operator fixes
//! the environment in one pass instead of one restart per key.

use thiserror::Error;

/// Environment variable names, in reporting order.
pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const TAVILY_API_KEY: &str = "TAVILY_API_KEY";
pub const BROWSEAI_API_KEY: &str = "BROWSEAI_API_KEY";
pub const APIFY_API_KEY: &str = "APIFY_API_KEY";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credentials: {}", keys.join(", "))]
    MissingCredentials { keys: Vec<String> },
}

/// Provider credentials, one per external service.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub openrouter_api_key: String,
    pub tavily_api_key: String,
    pub browseai_api_key: String,
    pub apify_api_key: String,
}

impl Credentials {
    /// Read all credentials from the environment.
    ///
    /// Empty values count as missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut read = |key: &str| match std::env::var(key) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(key.to_string());
                String::new()
            }
        };

        let credentials = Self {
            openrouter_api_key: read(OPENROUTER_API_KEY),
            tavily_api_key: read(TAVILY_API_KEY),
            browseai_api_key: read(BROWSEAI_API_KEY),
            apify_api_key: read(APIFY_API_KEY),
        };

        if missing.is_empty() {
            Ok(credentials)
        } else {
            Err(ConfigError::MissingCredentials { keys: missing })
        }
    }
}
