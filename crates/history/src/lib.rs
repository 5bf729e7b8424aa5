//! # History Provider
//!
//! Commit listings and file contents for one repository, behind the
//! object-safe [`HistoryProvider`] trait.
//!
//! Two realizations ship:
//! - [`LocalGitProvider`] drives the `git` binary with bounded timeouts
//! - [`GitHubProvider`] talks to the GitHub REST API
//!
//! [`RepoRef::parse`] decides which one a user-supplied reference names and
//! [`open_provider`] builds it.

mod commit;
mod error;
mod github;
mod local;
mod provider;
mod repo_ref;

pub use commit::Commit;
pub use error::{HistoryError, Result};
pub use github::{parse_github_url, GitHubLocation, GitHubProvider, DEFAULT_API_BASE};
pub use local::LocalGitProvider;
pub use provider::HistoryProvider;
pub use repo_ref::{open_provider, ProviderOptions, RepoRef};
