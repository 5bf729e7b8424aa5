use crate::commit::Commit;
use crate::error::{HistoryError, Result};
use crate::provider::{decode_blob, HistoryProvider};
use crate::repo_ref::ProviderOptions;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const PER_PAGE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";
const USER_AGENT: &str = concat!("fn-history/", env!("CARGO_PKG_VERSION"));

/// Parts of a GitHub repository URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubLocation {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    pub file_path: Option<String>,
}

/// Parse `https://github.com/o/r`, `github.com/o/r`, `…/tree/<branch>` and
/// `…/blob/<branch>/<path>`
pub fn parse_github_url(url: &str) -> Result<GitHubLocation> {
    let trimmed = url.trim();
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.strip_prefix("github.com/").unwrap_or(rest);

    let parts: Vec<&str> = rest.trim_end_matches('/').split('/').collect();
    if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(HistoryError::invalid_reference(format!(
            "Invalid GitHub URL: {url}"
        )));
    }

    let owner = parts[0].to_string();
    let repo = parts[1].strip_suffix(".git").unwrap_or(parts[1]).to_string();

    let (branch, file_path) = if parts.len() >= 4 && matches!(parts[2], "tree" | "blob") {
        let file_path = (parts.len() > 4).then(|| parts[4..].join("/"));
        (Some(parts[3].to_string()), file_path)
    } else {
        (None, None)
    };

    Ok(GitHubLocation {
        owner,
        repo,
        branch,
        file_path,
    })
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    message: String,
    author: Option<Signature>,
    committer: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    name: Option<String>,
    email: Option<String>,
    date: Option<String>,
}

impl From<CommitItem> for Commit {
    fn from(item: CommitItem) -> Self {
        let detail = item.commit;
        // Same date kind as `git log --format=%cI`
        let date = detail
            .committer
            .as_ref()
            .and_then(|sig| sig.date.clone())
            .or_else(|| detail.author.as_ref().and_then(|sig| sig.date.clone()))
            .unwrap_or_default();
        let (name, email) = match detail.author {
            Some(sig) => (sig.name.unwrap_or_default(), sig.email.unwrap_or_default()),
            None => Default::default(),
        };
        Commit::new(item.sha, name, email, date, detail.message)
    }
}

/// History of a GitHub repository through the REST API
pub struct GitHubProvider {
    client: Client,
    api_base: String,
    token: Option<String>,
    owner: String,
    repo: String,
    branch: String,
}

impl GitHubProvider {
    /// Connect to the repository, resolving its default branch when the
    /// location names none
    pub async fn connect(location: GitHubLocation, options: &ProviderOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut provider = Self {
            client,
            api_base: options.github_api_base.trim_end_matches('/').to_string(),
            token: options.github_token.clone(),
            owner: location.owner,
            repo: location.repo,
            branch: location.branch.unwrap_or_default(),
        };

        if provider.branch.is_empty() {
            let url = provider.repo_url("");
            let response = provider.send(provider.get(&url, JSON_MEDIA_TYPE)).await?;
            let info: RepoInfo = serde_json::from_slice(&response.bytes().await?)?;
            log::debug!("{} default branch is {}", provider.repository_id(), info.default_branch);
            provider.branch = info.default_branch;
        }

        Ok(provider)
    }

    /// Branch or ref that "current" reads resolve against
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!("{}/repos/{}/{}{suffix}", self.api_base, self.owner, self.repo)
    }

    fn get(&self, url: &str, media_type: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, media_type)
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        check_status(request.send().await?)
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let hint = if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        " (rate limited? set GITHUB_TOKEN)"
    } else {
        ""
    };
    Err(HistoryError::api(format!("{status} from {}{hint}", response.url())))
}

#[async_trait]
impl HistoryProvider for GitHubProvider {
    fn repository_id(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    async fn list_commits(&self, file_path: &str) -> Result<Vec<Commit>> {
        let url = self.repo_url("/commits");
        let per_page = PER_PAGE.to_string();
        let mut commits = Vec::new();

        for page in 1usize.. {
            let page_param = page.to_string();
            let request = self.get(&url, JSON_MEDIA_TYPE).query(&[
                ("path", file_path),
                ("sha", self.branch.as_str()),
                ("per_page", per_page.as_str()),
                ("page", page_param.as_str()),
            ]);
            let response = self.send(request).await?;
            let items: Vec<CommitItem> = serde_json::from_slice(&response.bytes().await?)?;

            let fetched = items.len();
            commits.extend(items.into_iter().map(Commit::from));
            log::debug!("Fetched commit page {page} ({fetched} items) for {file_path}");
            if fetched < PER_PAGE {
                break;
            }
        }

        Ok(commits)
    }

    async fn file_at(&self, commit_hash: &str, file_path: &str) -> Result<Option<String>> {
        let url = self.repo_url(&format!("/contents/{}", file_path.trim_start_matches('/')));
        let request = self
            .get(&url, RAW_MEDIA_TYPE)
            .query(&[("ref", commit_hash)]);

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            log::debug!("{file_path} is absent at {commit_hash}");
            return Ok(None);
        }
        let response = check_status(response)?;
        let bytes = response.bytes().await?;
        Ok(decode_blob(bytes.to_vec(), &format!("{commit_hash}:{file_path}")))
    }

    async fn current_file(&self, file_path: &str) -> Result<Option<String>> {
        self.file_at(&self.branch, file_path).await
    }
}
