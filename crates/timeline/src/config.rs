use crate::error::{Result, TimelineError};
use fn_history_entity_locator::LocatorConfig;
use fn_history_provider::{ProviderOptions, DEFAULT_API_BASE};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;
pub const MAX_FETCH_CONCURRENCY: usize = 16;
pub const DEFAULT_BATCH_SIZE: usize = 16;

pub const FETCH_CONCURRENCY_ENV: &str = "FN_HISTORY_FETCH_CONCURRENCY";

/// Tracing configuration, loadable from TOML:
///
/// ```toml
/// fetch_concurrency = 8
/// batch_size = 32
/// github_api_base = "https://github.example.com/api/v3"
///
/// [locator]
/// auto_priority = ["class", "function"]
/// include_attributes = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelineConfig {
    /// Content fetches in flight at once per request
    pub fetch_concurrency: usize,

    /// Commits prefetched ahead of the fold
    pub batch_size: usize,

    pub github_api_base: String,

    pub locator: LocatorConfig,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            batch_size: DEFAULT_BATCH_SIZE,
            github_api_base: DEFAULT_API_BASE.to_string(),
            locator: LocatorConfig::default(),
        }
    }
}

fn parse_fetch_concurrency(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, MAX_FETCH_CONCURRENCY)
}

impl TimelineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| TimelineError::invalid_config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TimelineError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Apply `FN_HISTORY_FETCH_CONCURRENCY` when set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        let raw = std::env::var(FETCH_CONCURRENCY_ENV).ok();
        self.with_concurrency_override(raw.as_deref())
    }

    fn with_concurrency_override(mut self, raw: Option<&str>) -> Self {
        if raw.is_some() {
            self.fetch_concurrency = parse_fetch_concurrency(raw, self.fetch_concurrency);
        }
        self
    }

    /// Fetch permits actually handed out
    #[must_use]
    pub fn effective_fetch_concurrency(&self) -> usize {
        self.fetch_concurrency.clamp(1, MAX_FETCH_CONCURRENCY)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_concurrency == 0 {
            return Err(TimelineError::invalid_config(
                "fetch_concurrency must be at least 1",
            ));
        }
        if self.batch_size == 0 {
            return Err(TimelineError::invalid_config("batch_size must be at least 1"));
        }
        if self.github_api_base.trim().is_empty() {
            return Err(TimelineError::invalid_config("github_api_base is empty"));
        }
        self.locator
            .validate()
            .map_err(|e| TimelineError::invalid_config(format!("locator: {e}")))
    }

    /// Provider knobs, with `GITHUB_TOKEN` read from the environment
    #[must_use]
    pub fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            github_api_base: self.github_api_base.clone(),
            ..ProviderOptions::from_env()
        }
    }
}
