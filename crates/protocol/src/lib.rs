use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const RESPONSE_SCHEMA_VERSION: u32 = 1;

/// Stable machine-readable failure codes carried by [`ErrorEnvelope`]
pub mod codes {
    pub const FILE_NOT_FOUND: &str = "file_not_found";
    pub const ENTITY_NOT_FOUND: &str = "entity_not_found";
    pub const AMBIGUOUS_TYPE: &str = "ambiguous_type";
    pub const PROVIDER_UNAVAILABLE: &str = "provider_unavailable";
    pub const INVALID_REQUEST: &str = "invalid_request";
}

/// Concrete category of a tracked construct
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Function,
    Class,
    Struct,
    Enum,
    Impl,
    Interface,
}

impl EntityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Impl => "impl",
            Self::Interface => "interface",
        }
    }
}

/// Category asked for by a caller; `auto` lets the tracker decide
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestedType {
    #[default]
    Auto,
    Function,
    Class,
    Struct,
    Enum,
    Impl,
    Interface,
}

impl RequestedType {
    pub fn kind(self) -> Option<EntityKind> {
        match self {
            Self::Auto => None,
            Self::Function => Some(EntityKind::Function),
            Self::Class => Some(EntityKind::Class),
            Self::Struct => Some(EntityKind::Struct),
            Self::Enum => Some(EntityKind::Enum),
            Self::Impl => Some(EntityKind::Impl),
            Self::Interface => Some(EntityKind::Interface),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Created,
    Modified,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct AnalyzeRequest {
    /// Local repository path or GitHub URL
    pub repository: String,
    pub file_path: String,
    pub entity_name: String,
    #[serde(default)]
    pub entity_type: RequestedType,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct CommitPayload {
    pub hash: String,
    pub short_hash: String,
    /// ISO-8601 committer date
    pub date: String,
    pub subject: String,
    pub message: String,
    pub author: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct SnapshotPayload {
    pub index: usize,
    pub commit: CommitPayload,
    pub source: String,
    pub start_line: usize,
    pub end_line: usize,
    pub change_type: ChangeType,
    /// 0-based offsets into `source` lines
    pub changed_lines: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct AnalyzeResponse {
    pub schema_version: u32,
    pub entity_name: String,
    pub file_path: String,
    pub repository: String,
    pub entity_type: EntityKind,
    pub snapshots: Vec<SnapshotPayload>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// JSON schema of [`AnalyzeResponse`]
pub fn response_schema() -> schemars::Schema {
    schemars::schema_for!(AnalyzeResponse)
}

pub fn serialize_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
