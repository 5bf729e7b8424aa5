use crate::types::{EntityInfo, EntityType};

/// Line span of a declaration (1-indexed, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }
}

/// Per-language boundary rules.
///
/// One implementation serves a family of languages; the locator keeps a table
/// of rules keyed on [`Language`](crate::Language). Implementations must be pure: the same
/// input always yields the same span, and malformed input yields `None`.
pub trait LocatorRule: Send + Sync {
    /// Whether this language has any construct of the given category
    fn supports(&self, entity_type: EntityType) -> bool;

    /// Find the first declaration of `entity_type` named `name`, in document order
    fn find(&self, source: &str, name: &str, entity_type: EntityType) -> Option<Span>;

    /// Every recognized declaration, in document order
    fn list(&self, source: &str) -> Vec<EntityInfo>;
}
