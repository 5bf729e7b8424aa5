use crate::commit::{parse_log, Commit, LOG_FORMAT};
use crate::error::{HistoryError, Result};
use crate::provider::{decode_blob, HistoryProvider};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::process::Output;
use tokio::time::{timeout, Duration};

// Blob reads are cheap; a full `git log` over a long-lived file is not.
const GIT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);
const GIT_LOG_TIMEOUT: Duration = Duration::from_secs(120);

/// History of a repository on the local filesystem, read through `git`
#[derive(Debug, Clone)]
pub struct LocalGitProvider {
    root: PathBuf,
    reference: String,
}

impl LocalGitProvider {
    /// Open the work tree containing `path`, reading history from `HEAD`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_at(path, "HEAD").await
    }

    /// Open the work tree containing `path`, reading history from `reference`
    pub async fn open_at(path: impl AsRef<Path>, reference: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let dir = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| HistoryError::NotARepository(format!("{}: {e}", path.display())))?;

        let output = run_git(&dir, &["rev-parse", "--show-toplevel"], GIT_QUERY_TIMEOUT).await?;
        if !output.status.success() {
            return Err(HistoryError::NotARepository(dir.display().to_string()));
        }

        let toplevel = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let root = tokio::fs::canonicalize(&toplevel).await?;
        log::debug!("Opened git work tree at {}", root.display());

        Ok(Self {
            root,
            reference: reference.into(),
        })
    }

    async fn git(&self, args: &[&str], limit: Duration) -> Result<Output> {
        run_git(&self.root, args, limit).await
    }
}

async fn run_git(dir: &Path, args: &[&str], limit: Duration) -> Result<Output> {
    let command = args.first().copied().unwrap_or("git").to_string();
    let output = timeout(
        limit,
        tokio::process::Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| HistoryError::Timeout(command))??;
    Ok(output)
}

/// Resolve `..` and `.` without touching the filesystem; `None` if the path
/// climbs above its starting point
fn lexical_normalize(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::Normal(part) => normalized.push(part),
            Component::RootDir | Component::Prefix(_) => normalized.push(component.as_os_str()),
        }
    }
    Some(normalized)
}

#[async_trait]
impl HistoryProvider for LocalGitProvider {
    fn repository_id(&self) -> String {
        self.root.display().to_string()
    }

    fn normalize_path(&self, file_path: &str) -> Result<String> {
        let outside = || {
            HistoryError::invalid_reference(format!(
                "{file_path} is outside repository {}",
                self.root.display()
            ))
        };

        let raw = Path::new(file_path);
        let absolute = if raw.is_absolute() {
            // Symlinked prefixes (e.g. /tmp on macOS) only line up once resolved
            std::fs::canonicalize(raw).unwrap_or_else(|_| raw.to_path_buf())
        } else {
            self.root.join(raw)
        };

        let absolute = lexical_normalize(&absolute).ok_or_else(outside)?;
        let relative = absolute.strip_prefix(&self.root).map_err(|_| outside())?;
        if relative.as_os_str().is_empty() {
            return Err(HistoryError::invalid_reference(format!(
                "{file_path} names the repository root, not a file"
            )));
        }

        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(parts.join("/"))
    }

    async fn list_commits(&self, file_path: &str) -> Result<Vec<Commit>> {
        let format = format!("--format={LOG_FORMAT}");
        let output = self
            .git(
                &["log", format.as_str(), self.reference.as_str(), "--", file_path],
                GIT_LOG_TIMEOUT,
            )
            .await?;
        if !output.status.success() {
            return Err(HistoryError::git("log", &output.stderr));
        }

        let commits = parse_log(&String::from_utf8_lossy(&output.stdout));
        log::debug!("git log found {} commits touching {file_path}", commits.len());
        Ok(commits)
    }

    async fn file_at(&self, commit_hash: &str, file_path: &str) -> Result<Option<String>> {
        let object = format!("{commit_hash}:{file_path}");
        let output = self
            .git(&["cat-file", "blob", object.as_str()], GIT_QUERY_TIMEOUT)
            .await?;
        if !output.status.success() {
            log::debug!("{object} is absent");
            return Ok(None);
        }
        Ok(decode_blob(output.stdout, &object))
    }

    async fn current_file(&self, file_path: &str) -> Result<Option<String>> {
        self.file_at(&self.reference, file_path).await
    }
}
