use thiserror::Error;

/// Result type for locator operations
pub type Result<T> = std::result::Result<T, LocatorError>;

/// Errors that can occur while configuring or running the locator.
///
/// A missing entity is not an error; lookups return `None` for that.
#[derive(Error, Debug)]
pub enum LocatorError {
    /// Unsupported language for the requested rule family
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown entity type string
    #[error("Unknown entity type '{0}' (expected auto, function, class, struct, enum, impl or interface)")]
    UnknownEntityType(String),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl LocatorError {
    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
