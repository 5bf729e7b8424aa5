//! # Entity Locator
//!
//! Finds the exact line span of a named code construct inside a source blob.
//!
//! ## Architecture
//!
//! ```text
//! Source Code + Language + Name + Type
//!     │
//!     ├──> Rule Table (keyed on Language)
//!     │    ├─> GrammarRule: tree-sitter parse → declaration walk
//!     │    │     (Rust, Python, TypeScript, JavaScript, Go, Java)
//!     │    └─> PatternRule: keyword scan → brace / indentation balance
//!     │          (C, C++, Ruby, unknown extensions)
//!     │
//!     ├──> Type Selection
//!     │    ├─> concrete type: only that category is tried
//!     │    └─> auto: configured priority order, first match wins
//!     │
//!     └──> EntityLocation { start_line, end_line, entity_type, source }
//! ```
//!
//! A construct that cannot be found is `None`, never an error: historical
//! revisions routinely predate or postdate the entity.
//!
//! ## Example
//!
//! ```rust
//! use fn_history_entity_locator::{EntityLocator, EntityType, Language, LocatorConfig, TypeSelector};
//!
//! let locator = EntityLocator::new(LocatorConfig::default()).unwrap();
//!
//! let code = r#"
//! fn process_data(input: &str) -> String {
//!     input.trim().to_uppercase()
//! }
//! "#;
//!
//! let found = locator
//!     .locate(code, Language::Rust, "process_data", TypeSelector::Auto)
//!     .unwrap();
//! assert_eq!(found.entity_type, EntityType::Function);
//! assert_eq!((found.start_line, found.end_line), (2, 4));
//! ```

mod config;
mod error;
mod grammar;
mod language;
mod locator;
mod pattern;
mod rule;
mod types;

pub use config::LocatorConfig;
pub use error::{LocatorError, Result};
pub use grammar::GrammarRule;
pub use language::{BlockStyle, Language};
pub use locator::EntityLocator;
pub use pattern::PatternRule;
pub use rule::{LocatorRule, Span};
pub use types::{EntityInfo, EntityLocation, EntityType, TypeSelector};
