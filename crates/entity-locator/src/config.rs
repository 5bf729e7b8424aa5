use crate::types::EntityType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration for entity location behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Order in which entity types are tried when the caller asks for `auto`.
    /// The first type whose rules produce a match wins.
    pub auto_priority: Vec<EntityType>,

    /// Extend spans over syntactically attached decorators, attributes and
    /// export wrappers
    pub include_attributes: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            auto_priority: vec![
                EntityType::Function,
                EntityType::Class,
                EntityType::Struct,
                EntityType::Enum,
                EntityType::Interface,
                EntityType::Impl,
            ],
            include_attributes: true,
        }
    }
}

impl LocatorConfig {
    /// Config with a custom auto-detection order
    pub fn with_priority(priority: impl IntoIterator<Item = EntityType>) -> Self {
        Self {
            auto_priority: priority.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.auto_priority.is_empty() {
            return Err("auto_priority must list at least one entity type".to_string());
        }

        let mut seen = HashSet::new();
        for entity_type in &self.auto_priority {
            if !seen.insert(*entity_type) {
                return Err(format!(
                    "auto_priority lists '{entity_type}' more than once"
                ));
            }
        }

        Ok(())
    }
}
