//! Configuration (explicit keys > environment variables).

use std::collections::HashMap;

/// Per-provider API keys and base-URL overrides.
///
/// Resolution order:
/// 1. Keys set explicitly via [`Config::set_api_key`] / [`Config::set_base_url`]
/// 2. Environment variables (`OPENAI_API_KEY`, `OPENAI_BASE_URL`, ...)
#[derive(Debug, Clone, Default)]
pub struct Config {
    api_keys: HashMap<String, String>,
    base_urls: HashMap<String, String>,
}

impl Config {
    /// Create an empty config; getters fall back to the environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard constructor; environment variables are consulted lazily.
    pub fn from_env() -> Self {
        Self::new()
    }

    /// Set an API key for a provider, overriding the environment.
    pub fn set_api_key(&mut self, provider: impl Into<String>, key: impl Into<String>) {
        self.api_keys.insert(provider.into(), key.into());
    }

    /// Set a base URL for a provider, overriding the environment.
    pub fn set_base_url(&mut self, provider: impl Into<String>, url: impl Into<String>) {
        self.base_urls.insert(provider.into(), url.into());
    }

    /// Resolve the API key for a provider.
    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys
            .get(provider)
            .cloned()
            .or_else(|| std::env::var(env_name(provider, "API_KEY")).ok())
    }

    /// Resolve the base URL override for a provider, if any.
    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls
            .get(provider)
            .cloned()
            .or_else(|| std::env::var(env_name(provider, "BASE_URL")).ok())
    }
}

fn env_name(provider: &str, suffix: &str) -> String {
    format!("{}_{}", provider.to_uppercase().replace('-', "_"), suffix)
}
