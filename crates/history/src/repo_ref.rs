use crate::error::Result;
use crate::github::{parse_github_url, GitHubLocation, GitHubProvider, DEFAULT_API_BASE};
use crate::local::LocalGitProvider;
use crate::provider::HistoryProvider;
use std::path::PathBuf;
use std::sync::Arc;

/// Where history is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoRef {
    Local(PathBuf),
    GitHub(GitHubLocation),
}

impl RepoRef {
    /// GitHub URLs (with or without scheme) become [`RepoRef::GitHub`];
    /// anything else is taken as a local path
    pub fn parse(reference: &str) -> Result<Self> {
        let trimmed = reference.trim();
        let is_github = ["https://github.com", "http://github.com", "github.com"]
            .iter()
            .any(|prefix| trimmed.starts_with(prefix));

        if is_github {
            parse_github_url(trimmed).map(Self::GitHub)
        } else {
            Ok(Self::Local(PathBuf::from(trimmed)))
        }
    }

    /// File path embedded in a `…/blob/<branch>/<path>` URL
    #[must_use]
    pub fn embedded_file_path(&self) -> Option<&str> {
        match self {
            Self::GitHub(location) => location.file_path.as_deref(),
            Self::Local(_) => None,
        }
    }
}

/// Knobs for building providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOptions {
    pub github_api_base: String,
    pub github_token: Option<String>,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            github_api_base: DEFAULT_API_BASE.to_string(),
            github_token: None,
        }
    }
}

impl ProviderOptions {
    /// Defaults plus `GITHUB_TOKEN` from the environment
    pub fn from_env() -> Self {
        Self {
            github_token: std::env::var("GITHUB_TOKEN")
                .ok()
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            ..Self::default()
        }
    }
}

/// Build the provider a reference names
pub async fn open_provider(
    reference: &RepoRef,
    options: &ProviderOptions,
) -> Result<Arc<dyn HistoryProvider>> {
    match reference {
        RepoRef::Local(path) => {
            let provider = LocalGitProvider::open(path).await?;
            Ok(Arc::new(provider))
        }
        RepoRef::GitHub(location) => {
            let provider = GitHubProvider::connect(location.clone(), options).await?;
            log::info!(
                "Reading {} from GitHub ({})",
                provider.repository_id(),
                provider.branch()
            );
            Ok(Arc::new(provider))
        }
    }
}
