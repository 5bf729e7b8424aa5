use fn_history_entity_locator::LocatorError;
use fn_history_protocol::{codes, ErrorEnvelope};
use fn_history_provider::HistoryError;
use serde_json::json;
use thiserror::Error;

/// Result type for history tracing
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Request-level failures. There is no partial success: any of these
/// discards the snapshots gathered so far.
#[derive(Error, Debug)]
pub enum TimelineError {
    /// File absent at the provider's current reference
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Entity never located in any commit
    #[error("No {entity_type} named '{name}' found in the history of {file_path}")]
    EntityNotFound {
        name: String,
        entity_type: String,
        file_path: String,
    },

    /// Several categories match under `auto`. The priority policy always
    /// picks one, so this is not produced today.
    #[error("'{name}' matches several entity types: {candidates}")]
    AmbiguousType { name: String, candidates: String },

    /// Repository backend failed (git, network, HTTP status)
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TimelineError {
    pub fn entity_not_found(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self::EntityNotFound {
            name: name.into(),
            entity_type: entity_type.into(),
            file_path: file_path.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Stable wire code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => codes::FILE_NOT_FOUND,
            Self::EntityNotFound { .. } => codes::ENTITY_NOT_FOUND,
            Self::AmbiguousType { .. } => codes::AMBIGUOUS_TYPE,
            Self::ProviderUnavailable(_) => codes::PROVIDER_UNAVAILABLE,
            Self::InvalidConfig(_) | Self::InvalidRequest(_) => codes::INVALID_REQUEST,
        }
    }

    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let envelope = ErrorEnvelope::new(self.code(), self.to_string());
        match self {
            Self::FileNotFound(path) => envelope.with_details(json!({ "file_path": path })),
            Self::EntityNotFound {
                name,
                entity_type,
                file_path,
            } => envelope
                .with_details(json!({
                    "entity_name": name,
                    "entity_type": entity_type,
                    "file_path": file_path,
                }))
                .with_hint("List trackable names with `fn-history entities <file>`"),
            Self::ProviderUnavailable(_) => envelope.with_hint("Retry later or check credentials"),
            _ => envelope,
        }
    }
}

impl From<HistoryError> for TimelineError {
    fn from(err: HistoryError) -> Self {
        match err {
            err if err.is_invalid_request() => Self::InvalidRequest(err.to_string()),
            err => Self::ProviderUnavailable(err.to_string()),
        }
    }
}

impl From<LocatorError> for TimelineError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::UnknownEntityType(_) => Self::InvalidRequest(err.to_string()),
            err => Self::InvalidConfig(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_history_errors_map_to_request_failures() {
        let err: TimelineError = HistoryError::api("502 Bad Gateway").into();
        assert_eq!(err.code(), codes::PROVIDER_UNAVAILABLE);

        let err: TimelineError = HistoryError::Timeout("log".into()).into();
        assert_eq!(err.code(), codes::PROVIDER_UNAVAILABLE);

        let err: TimelineError = HistoryError::invalid_reference("bad url").into();
        assert_eq!(err.code(), codes::INVALID_REQUEST);
    }

    #[test]
    fn test_envelope_carries_code_and_message() {
        let envelope = TimelineError::entity_not_found("parse", "function", "src/lib.rs").to_envelope();
        assert_eq!(envelope.code, "entity_not_found");
        assert_eq!(
            envelope.message,
            "No function named 'parse' found in the history of src/lib.rs"
        );
        assert!(envelope.hint.is_some());
        assert_eq!(
            envelope.details,
            Some(json!({
                "entity_name": "parse",
                "entity_type": "function",
                "file_path": "src/lib.rs",
            }))
        );
    }

    #[test]
    fn test_file_not_found_envelope_names_the_path() {
        let envelope = TimelineError::FileNotFound("src/gone.rs".into()).to_envelope();
        assert_eq!(envelope.code, codes::FILE_NOT_FOUND);
        assert_eq!(envelope.details, Some(json!({ "file_path": "src/gone.rs" })));
        assert_eq!(envelope.hint, None);
    }
}
