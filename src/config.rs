use std::time::Duration;

use crate::pipeline::generative::{
    GenerativeSettings, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT,
};

/// Application-level constants
pub const APP_NAME: &str = "GraviLog";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "GRAVILOG_LLM_BASE_URL";
pub const ENV_MODEL: &str = "GRAVILOG_LLM_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "GRAVILOG_LLM_TIMEOUT_SECS";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "gravilog=info,gravilog_lib=info,warn"
}

/// Gateway and generation settings for a production engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub request_timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub retry_transient: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            retry_transient: true,
        }
    }
}

impl EngineConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key lookup. Blank values and unparseable timeouts
    /// keep the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        config.api_key = get(ENV_API_KEY);
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %raw, "Ignoring invalid {ENV_TIMEOUT_SECS}"),
            }
        }
        config
    }

    pub fn generative_settings(&self) -> GenerativeSettings {
        GenerativeSettings {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: self.request_timeout,
            retry_transient: self.retry_transient,
        }
    }
}
