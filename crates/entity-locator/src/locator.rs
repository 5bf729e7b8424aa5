use crate::config::LocatorConfig;
use crate::error::{LocatorError, Result};
use crate::grammar::GrammarRule;
use crate::language::Language;
use crate::pattern::PatternRule;
use crate::rule::LocatorRule;
use crate::types::{EntityInfo, EntityLocation, EntityType, TypeSelector};
use std::collections::HashMap;
use std::path::Path;

/// Main locator interface: finds named entities in source text
pub struct EntityLocator {
    config: LocatorConfig,
    rules: HashMap<Language, Box<dyn LocatorRule>>,
}

impl EntityLocator {
    /// Create a new locator with configuration.
    ///
    /// Builds one rule per known language up front so lookups never fail on
    /// grammar setup.
    pub fn new(config: LocatorConfig) -> Result<Self> {
        config.validate().map_err(LocatorError::invalid_config)?;

        let mut rules: HashMap<Language, Box<dyn LocatorRule>> = HashMap::new();
        for language in Language::ALL {
            let rule: Box<dyn LocatorRule> = if language.supports_grammar() {
                Box::new(GrammarRule::new(language, config.include_attributes)?)
            } else {
                Box::new(PatternRule::new(language))
            };
            rules.insert(language, rule);
        }

        Ok(Self { config, rules })
    }

    fn rule(&self, language: Language) -> Option<&dyn LocatorRule> {
        self.rules
            .get(&language)
            .or_else(|| self.rules.get(&Language::Unknown))
            .map(Box::as_ref)
    }

    /// Locate the entity `name` inside `source`.
    ///
    /// A concrete selector tries only that category. `Auto` walks the
    /// configured priority order and returns the first category that
    /// matches. `None` means the text holds no such entity.
    #[must_use]
    pub fn locate(
        &self,
        source: &str,
        language: Language,
        name: &str,
        selector: TypeSelector,
    ) -> Option<EntityLocation> {
        if name.is_empty() || source.is_empty() {
            return None;
        }
        let rule = self.rule(language)?;

        let candidates: Vec<EntityType> = match selector {
            TypeSelector::Exact(entity_type) => vec![entity_type],
            TypeSelector::Auto => self.config.auto_priority.clone(),
        };

        for entity_type in candidates {
            if !rule.supports(entity_type) {
                continue;
            }
            if let Some(span) = rule.find(source, name, entity_type) {
                log::debug!(
                    "Located {} '{name}' at lines {}-{} ({})",
                    entity_type,
                    span.start_line,
                    span.end_line,
                    language.as_str()
                );
                return EntityLocation::from_lines(
                    source,
                    span.start_line,
                    span.end_line,
                    entity_type,
                );
            }
        }

        log::trace!("No {selector} '{name}' in {} source", language.as_str());
        None
    }

    /// Locate using the language implied by `path`
    #[must_use]
    pub fn locate_in_file(
        &self,
        source: &str,
        path: impl AsRef<Path>,
        name: &str,
        selector: TypeSelector,
    ) -> Option<EntityLocation> {
        self.locate(source, Language::from_path(path), name, selector)
    }

    /// Every recognized declaration in `source`, in document order
    #[must_use]
    pub fn list_entities(&self, source: &str, language: Language) -> Vec<EntityInfo> {
        self.rule(language)
            .map(|rule| rule.list(source))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn default_locator() -> EntityLocator {
        EntityLocator::new(LocatorConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = EntityLocator::new(LocatorConfig::with_priority([]));
        assert!(matches!(result, Err(LocatorError::InvalidConfig(_))));
    }

    #[test]
    fn test_locate_rust_function() {
        let locator = default_locator();
        let code = "use std::io;\n\nfn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n";

        let found = locator
            .locate(code, Language::Rust, "add", TypeSelector::Auto)
            .unwrap();
        assert_eq!(found.entity_type, EntityType::Function);
        assert_eq!((found.start_line, found.end_line), (3, 5));
        assert_eq!(found.source, "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}");
        assert_eq!(found.signature, "fn add(a: i32, b: i32) -> i32 {");
    }

    #[test]
    fn test_exact_type_does_not_fall_back() {
        let locator = default_locator();
        let code = "def process(x):\n    return x\n";

        assert!(locator
            .locate(code, Language::Python, "process", TypeSelector::Exact(EntityType::Class))
            .is_none());
        assert!(locator
            .locate(code, Language::Python, "process", EntityType::Function.into())
            .is_some());
    }

    #[test]
    fn test_auto_prefers_configured_order() {
        // Both an enum and an impl are named `Mode`
        let code = "enum Mode { A, B }\n\nimpl Mode {\n    fn a() {}\n}\n";

        let default = default_locator();
        let found = default
            .locate(code, Language::Rust, "Mode", TypeSelector::Auto)
            .unwrap();
        assert_eq!(found.entity_type, EntityType::Enum);
        assert_eq!((found.start_line, found.end_line), (1, 1));

        let impl_first =
            EntityLocator::new(LocatorConfig::with_priority([EntityType::Impl, EntityType::Enum]))
                .unwrap();
        let found = impl_first
            .locate(code, Language::Rust, "Mode", TypeSelector::Auto)
            .unwrap();
        assert_eq!(found.entity_type, EntityType::Impl);
        assert_eq!((found.start_line, found.end_line), (3, 5));
    }

    #[test]
    fn test_unsupported_type_for_language_is_absent() {
        let locator = default_locator();
        let code = "class Point:\n    pass\n";
        assert!(locator
            .locate(code, Language::Python, "Point", EntityType::Struct.into())
            .is_none());
    }

    #[test]
    fn test_empty_inputs() {
        let locator = default_locator();
        assert!(locator.locate("", Language::Rust, "a", TypeSelector::Auto).is_none());
        assert!(locator
            .locate("fn a() {}", Language::Rust, "", TypeSelector::Auto)
            .is_none());
    }

    #[test]
    fn test_locate_in_file_uses_extension() {
        let locator = default_locator();
        let code = "int square(int x) {\n    return x * x;\n}\n";
        let found = locator
            .locate_in_file(code, "src/math.c", "square", TypeSelector::Auto)
            .unwrap();
        assert_eq!(found.entity_type, EntityType::Function);
        assert_eq!((found.start_line, found.end_line), (1, 3));
    }

    #[test]
    fn test_list_entities() {
        let locator = default_locator();
        let code = "struct A;\n\nimpl A {\n    fn new() -> Self { A }\n}\n";
        let listed: Vec<_> = locator
            .list_entities(code, Language::Rust)
            .into_iter()
            .map(|info| (info.name, info.entity_type, info.start_line))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("A".to_string(), EntityType::Struct, 1),
                ("A".to_string(), EntityType::Impl, 3),
                ("new".to_string(), EntityType::Function, 4),
            ]
        );
    }
}
