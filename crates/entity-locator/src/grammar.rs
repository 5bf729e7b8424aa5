use crate::error::{LocatorError, Result};
use crate::language::Language;
use crate::rule::{LocatorRule, Span};
use crate::types::{EntityInfo, EntityType};
use tree_sitter::{Node, Parser, Tree};

/// Tree-sitter backed rules for languages with a maintained grammar
pub struct GrammarRule {
    language: Language,
    ts_language: tree_sitter::Language,
    include_attributes: bool,
}

impl GrammarRule {
    /// Create new grammar rule for a language
    pub fn new(language: Language, include_attributes: bool) -> Result<Self> {
        if !language.supports_grammar() {
            return Err(LocatorError::unsupported_language(language.as_str()));
        }

        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| LocatorError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self {
            language,
            ts_language,
            include_attributes,
        })
    }

    fn parse(&self, source: &str) -> Option<Tree> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&self.ts_language) {
            log::debug!("{} grammar rejected: {e}", self.language.as_str());
            return None;
        }
        let tree = parser.parse(source, None);
        if tree.is_none() {
            log::debug!("{} parse produced no tree", self.language.as_str());
        }
        tree
    }

    /// Declarations in document order (pre-order walk)
    fn declarations<'t>(&self, root: Node<'t>, source: &str) -> Vec<(Node<'t>, EntityType, String)> {
        let mut found = Vec::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if let Some((entity_type, name)) = self.classify(node, source) {
                found.push((node, entity_type, name));
            }

            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        found
    }

    /// Map a node to the entity category it declares, with its name
    fn classify(&self, node: Node, source: &str) -> Option<(EntityType, String)> {
        let entity_type = match self.language {
            Language::Rust => Self::classify_rust(node),
            Language::Python => Self::classify_python(node),
            Language::JavaScript => Self::classify_js(node, false),
            Language::TypeScript | Language::Tsx => Self::classify_js(node, true),
            Language::Go => Self::classify_go(node),
            Language::Java => Self::classify_java(node),
            _ => None,
        }?;

        let name = match (self.language, entity_type) {
            (Language::Rust, EntityType::Impl) => {
                let target = node.child_by_field_name("type")?;
                Self::base_type_name(target, source)?
            }
            _ => node_text(node.child_by_field_name("name")?, source)?.to_string(),
        };

        Some((entity_type, name))
    }

    fn classify_rust(node: Node) -> Option<EntityType> {
        match node.kind() {
            "function_item" | "function_signature_item" => Some(EntityType::Function),
            "struct_item" | "union_item" => Some(EntityType::Struct),
            "enum_item" => Some(EntityType::Enum),
            "trait_item" => Some(EntityType::Interface),
            "impl_item" => Some(EntityType::Impl),
            _ => None,
        }
    }

    fn classify_python(node: Node) -> Option<EntityType> {
        match node.kind() {
            "function_definition" => Some(EntityType::Function),
            "class_definition" => Some(EntityType::Class),
            _ => None,
        }
    }

    fn classify_js(node: Node, typescript: bool) -> Option<EntityType> {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" | "method_definition" => {
                Some(EntityType::Function)
            }
            "function_signature" | "method_signature" | "abstract_method_signature"
                if typescript =>
            {
                Some(EntityType::Function)
            }
            // const handler = () => { ... }
            "variable_declarator" => {
                let value = node.child_by_field_name("value")?;
                matches!(
                    value.kind(),
                    "arrow_function" | "function_expression" | "function" | "generator_function"
                )
                .then_some(EntityType::Function)
            }
            "class_declaration" => Some(EntityType::Class),
            "abstract_class_declaration" if typescript => Some(EntityType::Class),
            "interface_declaration" if typescript => Some(EntityType::Interface),
            "enum_declaration" if typescript => Some(EntityType::Enum),
            _ => None,
        }
    }

    fn classify_go(node: Node) -> Option<EntityType> {
        match node.kind() {
            "function_declaration" | "method_declaration" => Some(EntityType::Function),
            "type_spec" => match node.child_by_field_name("type")?.kind() {
                "struct_type" => Some(EntityType::Struct),
                "interface_type" => Some(EntityType::Interface),
                _ => None,
            },
            _ => None,
        }
    }

    fn classify_java(node: Node) -> Option<EntityType> {
        match node.kind() {
            "method_declaration" | "constructor_declaration" => Some(EntityType::Function),
            "class_declaration" | "record_declaration" => Some(EntityType::Class),
            "interface_declaration" | "annotation_type_declaration" => {
                Some(EntityType::Interface)
            }
            "enum_declaration" => Some(EntityType::Enum),
            _ => None,
        }
    }

    /// Base name of an impl target: `Foo` for `Foo<T>`, `a::Foo`, `&Foo`
    fn base_type_name(node: Node, source: &str) -> Option<String> {
        match node.kind() {
            "type_identifier" | "primitive_type" => node_text(node, source).map(str::to_string),
            "generic_type" | "reference_type" | "pointer_type" => {
                Self::base_type_name(node.child_by_field_name("type")?, source)
            }
            "scoped_type_identifier" => {
                Self::base_type_name(node.child_by_field_name("name")?, source)
            }
            _ => None,
        }
    }

    /// Node whose extent the entity occupies, including attached wrappers
    fn extent_node<'t>(&self, node: Node<'t>) -> Node<'t> {
        let mut extent = node;

        // Declarators live inside `const a = ...;` / `let a = ...;` statements
        if extent.kind() == "variable_declarator" {
            if let Some(parent) = extent.parent() {
                if matches!(parent.kind(), "lexical_declaration" | "variable_declaration") {
                    extent = parent;
                }
            }
        }

        // `type Foo struct {...}` declares through a single type_spec
        if extent.kind() == "type_spec" {
            if let Some(parent) = extent.parent() {
                if parent.kind() == "type_declaration" && parent.named_child_count() == 1 {
                    extent = parent;
                }
            }
        }

        if !self.include_attributes {
            return extent;
        }

        if let Some(parent) = extent.parent() {
            if matches!(parent.kind(), "decorated_definition" | "export_statement") {
                extent = parent;
            }
        }

        extent
    }

    /// Line span of a declaration node
    fn span_of(&self, node: Node) -> Span {
        let extent = self.extent_node(node);

        let mut start_row = extent.start_position().row;
        if self.include_attributes {
            // Outer attributes and member decorators are siblings, not children
            let mut prev = extent.prev_sibling();
            while let Some(sibling) = prev {
                let attached = matches!(sibling.kind(), "attribute_item" | "decorator")
                    && sibling.end_position().row + 1 >= start_row;
                if !attached {
                    break;
                }
                start_row = sibling.start_position().row;
                prev = sibling.prev_sibling();
            }
        }

        let end = extent.end_position();
        let end_row = if end.column == 0 && end.row > start_row {
            end.row - 1
        } else {
            end.row
        };

        Span::new(start_row + 1, end_row + 1)
    }
}

impl LocatorRule for GrammarRule {
    fn supports(&self, entity_type: EntityType) -> bool {
        use EntityType::{Class, Enum, Function, Impl, Interface, Struct};
        match self.language {
            Language::Rust => matches!(entity_type, Function | Struct | Enum | Interface | Impl),
            Language::Python | Language::JavaScript => matches!(entity_type, Function | Class),
            Language::TypeScript | Language::Tsx => {
                matches!(entity_type, Function | Class | Interface | Enum)
            }
            Language::Go => matches!(entity_type, Function | Struct | Interface),
            Language::Java => matches!(entity_type, Function | Class | Interface | Enum),
            _ => false,
        }
    }

    fn find(&self, source: &str, name: &str, entity_type: EntityType) -> Option<Span> {
        if !self.supports(entity_type) {
            return None;
        }

        let tree = self.parse(source)?;
        self.declarations(tree.root_node(), source)
            .into_iter()
            .find(|(_, found_type, found_name)| *found_type == entity_type && found_name == name)
            .map(|(node, _, _)| self.span_of(node))
    }

    fn list(&self, source: &str) -> Vec<EntityInfo> {
        let Some(tree) = self.parse(source) else {
            return Vec::new();
        };

        let lines: Vec<&str> = source.split('\n').collect();
        self.declarations(tree.root_node(), source)
            .into_iter()
            .map(|(node, entity_type, name)| {
                let span = self.span_of(node);
                EntityInfo {
                    name,
                    entity_type,
                    start_line: span.start_line,
                    end_line: span.end_line,
                    signature: lines
                        .get(span.start_line - 1)
                        .map(|line| line.trim().to_string())
                        .unwrap_or_default(),
                }
            })
            .collect()
    }
}

fn node_text<'s>(node: Node, source: &'s str) -> Option<&'s str> {
    node.utf8_text(source.as_bytes()).ok()
}
