use serde::{Deserialize, Serialize};

/// `git log` pretty format: hash, author name, author email, committer date
/// (strict ISO-8601) and raw body, unit-separated, one record per commit
pub(crate) const LOG_FORMAT: &str = "%H%x1f%an%x1f%ae%x1f%cI%x1f%B%x1e";

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

/// One commit that touched the tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub short_hash: String,
    pub author_name: String,
    pub author_email: String,
    /// ISO-8601 committer date
    pub timestamp: String,
    /// First line of the message, trimmed
    pub subject: String,
    pub message: String,
}

impl Commit {
    pub fn new(
        hash: impl Into<String>,
        author_name: impl Into<String>,
        author_email: impl Into<String>,
        timestamp: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let hash = hash.into();
        let message = message.into();
        let author_name = author_name.into();

        Self {
            short_hash: hash.chars().take(7).collect(),
            subject: message.lines().next().unwrap_or("").trim().to_string(),
            author_name: if author_name.trim().is_empty() {
                "Unknown".to_string()
            } else {
                author_name
            },
            author_email: author_email.into(),
            timestamp: timestamp.into(),
            hash,
            message,
        }
    }
}

/// Parse `git log --format=LOG_FORMAT` output, newest first as git prints it
pub(crate) fn parse_log(output: &str) -> Vec<Commit> {
    output
        .split(RECORD_SEP)
        .map(|record| record.trim_start_matches(['\n', '\r']))
        .filter(|record| !record.trim().is_empty())
        .filter_map(|record| {
            let fields: Vec<&str> = record.splitn(5, FIELD_SEP).collect();
            let [hash, name, email, date, body] = fields.as_slice() else {
                log::warn!("Skipping malformed git log record ({} fields)", fields.len());
                return None;
            };
            Some(Commit::new(
                hash.trim(),
                *name,
                *email,
                date.trim(),
                body.trim_end(),
            ))
        })
        .collect()
}
