use crate::commit::Commit;
use crate::error::Result;
use async_trait::async_trait;

/// Read-only view of one repository's history
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Display identifier: canonical local path or `owner/repo`
    fn repository_id(&self) -> String;

    /// Map a user-supplied path onto the repository-relative form the other
    /// operations expect
    fn normalize_path(&self, file_path: &str) -> Result<String> {
        Ok(file_path.trim_start_matches("./").to_string())
    }

    /// Commits that touched `file_path`, newest first
    async fn list_commits(&self, file_path: &str) -> Result<Vec<Commit>>;

    /// Content of `file_path` at `commit_hash`; `None` when the path is
    /// missing there or the blob is not UTF-8
    async fn file_at(&self, commit_hash: &str, file_path: &str) -> Result<Option<String>>;

    /// Content of `file_path` at the provider's current reference
    async fn current_file(&self, file_path: &str) -> Result<Option<String>>;
}

pub(crate) fn decode_blob(bytes: Vec<u8>, origin: &str) -> Option<String> {
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(_) => {
            log::warn!("Treating non UTF-8 content at {origin} as absent");
            None
        }
    }
}
