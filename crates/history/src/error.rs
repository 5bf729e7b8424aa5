use thiserror::Error;

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors raised while reading repository history
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Directory is not inside a git work tree
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    /// Malformed repository reference or path outside the repository
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A git invocation exited unsuccessfully
    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    /// A git invocation exceeded its time budget
    #[error("git {0} timed out")]
    Timeout(String),

    /// GitHub answered with a non-success status
    #[error("GitHub API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HistoryError {
    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        Self::InvalidReference(msg.into())
    }

    pub fn git(command: impl Into<String>, stderr: &[u8]) -> Self {
        Self::Git {
            command: command.into(),
            message: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Caller supplied something unusable, as opposed to the backend failing
    #[must_use]
    pub const fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidReference(_) | Self::NotARepository(_))
    }
}
