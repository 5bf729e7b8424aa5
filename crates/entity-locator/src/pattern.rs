use crate::language::{BlockStyle, Language};
use crate::rule::{LocatorRule, Span};
use crate::types::{EntityInfo, EntityType};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// How far past the declaration line a body opener is searched for
const MAX_SIGNATURE_LINES: usize = 32;

/// Identifier capture used when listing every declaration
const ANY_NAME: &str = r"(?P<name>[A-Za-z_][A-Za-z0-9_]*[?!]?)";

/// Optional leading modifiers (`pub`, `pub(crate)`, `export default`,
/// `static`, `@objc`) before a declaration keyword
const MODIFIERS: &str = r"^\s*(?:[@A-Za-z_][\w@]*(?:\([^)]*\))?\s+)*";

/// Words that look like calls or declarations to the C-like patterns
const RESERVED: &[&str] = &[
    "if", "for", "while", "switch", "return", "sizeof", "catch", "else", "do", "case", "new",
    "delete", "throw",
];

/// Line-oriented fallback for languages without a grammar.
///
/// Declarations are found with keyword patterns; bodies are closed by a naive
/// brace count (braces inside strings and comments are counted too), by `end`
/// nesting for Ruby, or by indentation for brace-less text.
pub struct PatternRule {
    language: Language,
    /// Compiled declaration patterns per (category, escaped name)
    compiled: Mutex<HashMap<(EntityType, String), Arc<[Regex]>>>,
}

/// Outcome of scanning for the body of a candidate declaration
#[derive(Debug, PartialEq, Eq)]
enum Body {
    /// Body closes on this 0-based line
    EndsAt(usize),
    /// Declaration only (prototype, forward declaration, call statement)
    Declaration,
    /// No body opener found
    Missing,
}

impl PatternRule {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            compiled: Mutex::new(HashMap::new()),
        }
    }

    /// Declaration templates; `{name}` is substituted with the target name
    fn templates(&self, entity_type: EntityType) -> &'static [&'static str] {
        match (self.language, entity_type) {
            (Language::C, EntityType::Function) => {
                &[r"^\s*(?:[A-Za-z_][\w\s\*]*[\s\*])?{name}\s*\("]
            }
            (Language::Cpp, EntityType::Function) => {
                &[r"^\s*(?:[A-Za-z_~][\w\s\*&<>:,~]*[\s\*&:])?{name}\s*\("]
            }
            // Anchored to a definition: a parameter such as `struct Point *p`
            // must not match
            (Language::C | Language::Cpp, EntityType::Struct) => {
                &[r"^\s*(?:typedef\s+)?struct\s+{name}\s*(?:\{|:[^:]|$)"]
            }
            (Language::C | Language::Cpp, EntityType::Enum) => {
                &[r"^\s*(?:typedef\s+)?enum\s+(?:class\s+|struct\s+)?{name}\s*(?:\{|:[^:]|$)"]
            }
            (Language::Cpp, EntityType::Class) => &[
                r"^\s*(?:template\s*<[^>]*>\s*)?class\s+{name}\s*(?:\{|:[^:]|final\b|$)",
            ],
            (Language::Ruby, EntityType::Function) => {
                &[r"^\s*def\s+(?:self\.)?{name}(?:[\s\(;=]|$)"]
            }
            (Language::Ruby, EntityType::Class) => &[r"^\s*class\s+{name}(?:[\s<;]|$)"],
            (Language::Ruby, EntityType::Interface) => &[r"^\s*module\s+{name}(?:[\s;]|$)"],
            (Language::Unknown, EntityType::Function) => &[
                r"{modifiers}(?:function|def|fn|func|sub|proc)\s+{name}\b",
                r"^\s*(?:[A-Za-z_][\w\s\*&]*[\s\*&])?{name}\s*\(",
            ],
            (Language::Unknown, EntityType::Class) => &[r"{modifiers}class\s+{name}\b"],
            (Language::Unknown, EntityType::Struct) => &[r"{modifiers}struct\s+{name}\b"],
            (Language::Unknown, EntityType::Enum) => &[r"{modifiers}enum\s+{name}\b"],
            (Language::Unknown, EntityType::Interface) => {
                &[r"{modifiers}(?:interface|trait|protocol)\s+{name}\b"]
            }
            (Language::Unknown, EntityType::Impl) => &[r"{modifiers}impl\b[^{;]*\b{name}\b"],
            _ => &[],
        }
    }

    /// Patterns for `entity_type` with `name_pattern` substituted, compiled
    /// once per rule. A trace looks up the same name in every commit.
    fn compile(&self, entity_type: EntityType, name_pattern: &str) -> Arc<[Regex]> {
        let key = (entity_type, name_pattern.to_string());
        let mut compiled = self
            .compiled
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(patterns) = compiled.get(&key) {
            return Arc::clone(patterns);
        }

        let patterns: Arc<[Regex]> = self
            .templates(entity_type)
            .iter()
            .filter_map(|template| {
                let pattern = template
                    .replace("{modifiers}", MODIFIERS)
                    .replace("{name}", name_pattern);
                match Regex::new(&pattern) {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        log::debug!("Skipping declaration pattern {pattern}: {e}");
                        None
                    }
                }
            })
            .collect();
        compiled.insert(key, Arc::clone(&patterns));
        patterns
    }

    fn is_comment(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        self.language
            .comment_prefixes()
            .iter()
            .any(|prefix| trimmed.starts_with(prefix))
    }

    /// Declaration lines matching any pattern that own a body, with their spans.
    /// Stops at the first hit when looking for a specific name.
    fn scan(&self, lines: &[&str], patterns: &[Regex], name: Option<&str>) -> Vec<(usize, String, Span)> {
        let mut found = Vec::new();
        let mut idx = 0;

        while idx < lines.len() {
            let line = lines[idx];
            if self.is_comment(line) {
                idx += 1;
                continue;
            }

            let matched = patterns.iter().find_map(|regex| {
                let caps = regex.captures(line)?;
                match name {
                    Some(name) => Some(name.to_string()),
                    None => {
                        let found_name = caps.name("name")?.as_str();
                        (!RESERVED.contains(&found_name)).then(|| found_name.to_string())
                    }
                }
            });

            if let Some(found_name) = matched {
                if let Body::EndsAt(end) = self.body_end(lines, idx) {
                    found.push((idx, found_name, Span::new(idx + 1, end + 1)));
                    if name.is_some() {
                        break;
                    }
                }
            }

            idx += 1;
        }

        found
    }

    fn body_end(&self, lines: &[&str], start: usize) -> Body {
        match self.language.block_style() {
            BlockStyle::Braces if self.language == Language::Unknown => {
                unknown_body_end(lines, start)
            }
            BlockStyle::Braces => brace_end(lines, start),
            BlockStyle::EndKeyword => end_keyword_end(lines, start),
            BlockStyle::Indentation => indent_end(lines, start),
        }
    }
}

impl LocatorRule for PatternRule {
    fn supports(&self, entity_type: EntityType) -> bool {
        !self.templates(entity_type).is_empty()
    }

    fn find(&self, source: &str, name: &str, entity_type: EntityType) -> Option<Span> {
        let patterns = self.compile(entity_type, &regex::escape(name));
        if patterns.is_empty() {
            return None;
        }

        let lines: Vec<&str> = source.split('\n').collect();
        self.scan(&lines, &patterns, Some(name))
            .into_iter()
            .next()
            .map(|(_, _, span)| span)
    }

    fn list(&self, source: &str) -> Vec<EntityInfo> {
        let owned: Vec<&str> = source.split('\n').collect();
        let lines: &[&str] = &owned;
        let mut entities: Vec<EntityInfo> = EntityType::ALL
            .into_iter()
            .flat_map(|entity_type| {
                let patterns = self.compile(entity_type, ANY_NAME);
                self.scan(lines, &patterns, None)
                    .into_iter()
                    .map(move |(idx, name, span)| EntityInfo {
                        name,
                        entity_type,
                        start_line: span.start_line,
                        end_line: span.end_line,
                        signature: lines[idx].trim().to_string(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        entities.sort_by(|a, b| {
            a.start_line
                .cmp(&b.start_line)
                .then_with(|| a.end_line.cmp(&b.end_line))
        });
        entities
    }
}

/// Close a brace-delimited body by counting every `{` and `}` from the
/// declaration line on.
fn brace_end(lines: &[&str], start: usize) -> Body {
    let mut depth = 0usize;
    let mut opened = false;

    for (idx, line) in lines.iter().enumerate().skip(start) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' if opened => depth = depth.saturating_sub(1),
                ';' if !opened => return Body::Declaration,
                _ => {}
            }
        }

        if opened && depth == 0 {
            return Body::EndsAt(idx);
        }
        if !opened && idx - start >= MAX_SIGNATURE_LINES {
            return Body::Missing;
        }
    }

    if opened {
        // Unbalanced to the end of the file
        Body::EndsAt(lines.len().saturating_sub(1))
    } else {
        Body::Missing
    }
}

/// Pick the body style of a declaration in text of unknown language from the
/// declaration itself: `:` or an indented next line means indentation, a `{`
/// on the signature (or opening the next line) means braces.
fn unknown_body_end(lines: &[&str], start: usize) -> Body {
    let signature = lines[start].trim_end();
    if signature.ends_with(':') {
        return indent_end(lines, start);
    }
    if signature.contains('{') {
        return brace_end(lines, start);
    }

    // Signature continues on the next lines
    if signature.matches('(').count() > signature.matches(')').count() {
        return match brace_end(lines, start) {
            Body::Missing => indent_end(lines, start),
            body => body,
        };
    }

    let next = lines
        .iter()
        .skip(start + 1)
        .find(|line| !line.trim().is_empty());
    match next {
        Some(line) if line.trim_start().starts_with('{') => brace_end(lines, start),
        Some(line) if indent_of(line) > indent_of(lines[start]) => indent_end(lines, start),
        _ => match brace_end(lines, start) {
            Body::Missing => indent_end(lines, start),
            body => body,
        },
    }
}

/// `def x; end`, `class A; end`
fn inline_end() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:;|\s)end\s*$").ok()).as_ref()
}

/// `def square(x) = x * x`
fn endless_def() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^def\s+[^=]*\)\s*=[^=~]").ok())
        .as_ref()
}

/// Close a Ruby body by `end` nesting
fn end_keyword_end(lines: &[&str], start: usize) -> Body {
    const OPENERS: &[&str] = &[
        "def", "class", "module", "if", "unless", "while", "until", "case", "begin", "for",
    ];

    let closes_inline = |line: &str| inline_end().is_some_and(|re| re.is_match(line));

    let first = lines[start].trim();
    if closes_inline(first) || endless_def().is_some_and(|re| re.is_match(first)) {
        return Body::EndsAt(start);
    }

    let mut depth = 0usize;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            continue;
        }
        let first_word = trimmed
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .next()
            .unwrap_or("");

        let opens = OPENERS.contains(&first_word)
            || trimmed.ends_with(" do")
            || trimmed.contains(" do |");
        if opens && !closes_inline(trimmed) {
            depth += 1;
        }

        if first_word == "end" {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Body::EndsAt(idx);
            }
        }
    }

    Body::EndsAt(last_non_blank(lines, start, lines.len()))
}

/// Close an indentation-delimited body at the last line before the first
/// dedent to (or past) the declaration's indentation
fn indent_end(lines: &[&str], start: usize) -> Body {
    let base = indent_of(lines[start]);

    for (idx, line) in lines.iter().enumerate().skip(start + 1) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if indent_of(line) <= base {
            return Body::EndsAt(last_non_blank(lines, start, idx));
        }
    }

    Body::EndsAt(last_non_blank(lines, start, lines.len()))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Last non-blank line in `start..end`, never before `start`
fn last_non_blank(lines: &[&str], start: usize, end: usize) -> usize {
    (start..end)
        .rev()
        .find(|&idx| !lines[idx].trim().is_empty())
        .unwrap_or(start)
}
