use crate::error::LocatorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a trackable code construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Function, method or associated function
    Function,
    /// Class definition
    Class,
    /// Struct definition
    Struct,
    /// Enum definition
    Enum,
    /// Implementation block
    Impl,
    /// Interface, trait or protocol definition
    Interface,
}

impl EntityType {
    /// Every concrete type, in declaration order
    pub const ALL: [EntityType; 6] = [
        Self::Function,
        Self::Class,
        Self::Struct,
        Self::Enum,
        Self::Impl,
        Self::Interface,
    ];

    /// Get human-readable name
    #[must_use]
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

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "function" => Ok(Self::Function),
            "class" => Ok(Self::Class),
            "struct" => Ok(Self::Struct),
            "enum" => Ok(Self::Enum),
            "impl" => Ok(Self::Impl),
            "interface" => Ok(Self::Interface),
            _ => Err(LocatorError::UnknownEntityType(s.to_string())),
        }
    }
}

/// Requested entity type: a concrete category or automatic detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeSelector {
    #[default]
    Auto,
    Exact(EntityType),
}

impl TypeSelector {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Exact(entity_type) => entity_type.as_str(),
        }
    }

    /// The concrete type, if one was requested
    #[must_use]
    pub const fn exact(self) -> Option<EntityType> {
        match self {
            Self::Auto => None,
            Self::Exact(entity_type) => Some(entity_type),
        }
    }
}

impl From<EntityType> for TypeSelector {
    fn from(value: EntityType) -> Self {
        Self::Exact(value)
    }
}

impl fmt::Display for TypeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeSelector {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<EntityType>().map(Self::Exact)
    }
}

/// Result of a successful locate: where the entity lives in the probed text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLocation {
    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// Resolved entity type (never auto)
    pub entity_type: EntityType,

    /// Exact source lines of the span, joined with `\n`
    pub source: String,

    /// First line of the span, trimmed
    pub signature: String,
}

impl EntityLocation {
    /// Cut the `start_line..=end_line` span out of `content`.
    ///
    /// Returns `None` when the span does not fit the text.
    #[must_use]
    pub fn from_lines(
        content: &str,
        start_line: usize,
        end_line: usize,
        entity_type: EntityType,
    ) -> Option<Self> {
        if start_line == 0 || end_line < start_line {
            return None;
        }
        let lines: Vec<&str> = content.split('\n').collect();
        if end_line > lines.len() {
            return None;
        }
        let span = &lines[start_line - 1..end_line];
        Some(Self {
            start_line,
            end_line,
            entity_type,
            source: span.join("\n"),
            signature: span[0].trim().to_string(),
        })
    }

    /// Get the number of lines in this location
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// A declaration discovered while listing a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub name: String,
    pub entity_type: EntityType,
    pub start_line: usize,
    pub end_line: usize,
    pub signature: String,
}
