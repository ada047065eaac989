//! Syntax highlighting stage.
//!
//! Output is HTML using highlight.js class names (`hljs-keyword`,
//! `hljs-string`, ...) so existing highlight.js themes style it unchanged.

use crate::ts::{
    find_language, language_names, LanguageDef, SourceParser, SupportLang, TreeSitterError,
    LANGUAGES,
};
use thiserror::Error;
use tree_sitter::Node;

/// Relevance subtracted per ERROR or MISSING node during detection.
const ERROR_PENALTY: i64 = 5;

const CLASS_PREFIX: &str = "hljs-";

/// Highlights code into HTML.
pub trait Highlighter: Send + Sync {
    /// Names accepted by [`Highlighter::highlight`].
    fn languages(&self) -> Vec<String>;

    fn highlight(&self, code: &str, language: &str) -> Result<Highlighted, HighlightError>;

    /// Detect the language among `subset` (or every language) and highlight
    /// with the best match.
    fn highlight_auto(
        &self,
        code: &str,
        subset: Option<&[&str]>,
    ) -> Result<Highlighted, HighlightError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    pub value: String,
    pub language: Option<String>,
    pub relevance: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HighlightError {
    #[error("Unknown language: \"{0}\"")]
    UnknownLanguage(String),

    #[error(transparent)]
    TreeSitter(#[from] TreeSitterError),
}

/// Highlighter driven by the bundled tree-sitter grammars.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterHighlighter;

impl Highlighter for TreeSitterHighlighter {
    fn languages(&self) -> Vec<String> {
        language_names().map(str::to_string).collect()
    }

    fn highlight(&self, code: &str, language: &str) -> Result<Highlighted, HighlightError> {
        let def = find_language(language)
            .ok_or_else(|| HighlightError::UnknownLanguage(language.to_string()))?;
        let rendered = render(code, def.grammar)?;
        Ok(Highlighted {
            relevance: rendered.relevance(),
            value: rendered.html,
            language: Some(def.name.to_string()),
        })
    }

    fn highlight_auto(
        &self,
        code: &str,
        subset: Option<&[&str]>,
    ) -> Result<Highlighted, HighlightError> {
        let candidates: Vec<&LanguageDef> = match subset {
            Some(names) => names.iter().filter_map(|name| find_language(name)).collect(),
            None => LANGUAGES.iter().collect(),
        };

        let mut best: Option<(&LanguageDef, Rendered)> = None;
        for def in candidates {
            let rendered = render(code, def.grammar)?;
            let better = best
                .as_ref()
                .map_or(true, |(_, current)| rendered.relevance() > current.relevance());
            if better {
                best = Some((def, rendered));
            }
        }

        match best {
            Some((def, rendered)) if rendered.relevance() > 0 => {
                log::debug!(
                    "detected {} (relevance {})",
                    def.name,
                    rendered.relevance()
                );
                Ok(Highlighted {
                    relevance: rendered.relevance(),
                    value: rendered.html,
                    language: Some(def.name.to_string()),
                })
            }
            _ => {
                let mut value = String::with_capacity(code.len());
                escape_into(&mut value, code);
                Ok(Highlighted {
                    value,
                    language: None,
                    relevance: 0,
                })
            }
        }
    }
}

struct Rendered {
    html: String,
    scopes: usize,
    errors: usize,
}

impl Rendered {
    fn relevance(&self) -> i64 {
        self.scopes as i64 - ERROR_PENALTY * self.errors as i64
    }
}

fn render(code: &str, grammar: SupportLang) -> Result<Rendered, TreeSitterError> {
    let mut parser = SourceParser::new(grammar)?;
    let parsed = parser.parse_with_source(code)?;
    let root = parsed.root_node();

    let mut renderer = Renderer {
        source: code,
        grammar,
        html: String::with_capacity(code.len() * 2),
        scopes: 0,
        errors: parsed.error_nodes().len(),
    };
    renderer.emit_range(0, root.start_byte());
    renderer.emit_node(root)?;
    renderer.emit_range(root.end_byte(), code.len());

    Ok(Rendered {
        html: renderer.html,
        scopes: renderer.scopes,
        errors: renderer.errors,
    })
}

struct Renderer<'s> {
    source: &'s str,
    grammar: SupportLang,
    html: String,
    scopes: usize,
    errors: usize,
}

impl Renderer<'_> {
    fn emit_node(&mut self, node: Node<'_>) -> Result<(), TreeSitterError> {
        if let Some(embedded) = embedded_grammar(node, self.grammar, self.source) {
            let inner = render(&self.source[node.byte_range()], embedded)?;
            self.html.push_str(&inner.html);
            self.scopes += inner.scopes;
            self.errors += inner.errors;
            return Ok(());
        }

        let scope = classify(node, self.grammar);
        if let Some(scope) = scope {
            self.html.push_str("<span class=\"");
            for (index, part) in scope.split(' ').enumerate() {
                // hljs prefixes only the first class of a compound scope
                if index == 0 {
                    self.html.push_str(CLASS_PREFIX);
                    self.html.push_str(part);
                } else {
                    self.html.push(' ');
                    self.html.push_str(part);
                }
            }
            self.html.push_str("\">");
            self.scopes += 1;
        }

        let mut position = node.start_byte();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.emit_range(position, child.start_byte());
            self.emit_node(child)?;
            position = position.max(child.end_byte());
        }
        self.emit_range(position, node.end_byte());

        if scope.is_some() {
            self.html.push_str("</span>");
        }
        Ok(())
    }

    fn emit_range(&mut self, start: usize, end: usize) {
        if start < end {
            escape_into(&mut self.html, &self.source[start..end]);
        }
    }
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
}

/// Grammar for the contents of `<script>` and `<style>` in markup.
fn embedded_grammar(node: Node<'_>, grammar: SupportLang, source: &str) -> Option<SupportLang> {
    if !matches!(grammar, SupportLang::Html) || node.kind() != "raw_text" {
        return None;
    }
    let parent = node.parent()?;
    match parent.kind() {
        "style_element" => Some(SupportLang::Css),
        "script_element" => match script_lang(parent, source) {
            Some("ts" | "typescript") => Some(SupportLang::TypeScript),
            _ => Some(SupportLang::JavaScript),
        },
        _ => None,
    }
}

/// Value of the `lang` attribute on a script element's start tag.
fn script_lang<'s>(script: Node<'_>, source: &'s str) -> Option<&'s str> {
    let mut cursor = script.walk();
    let start_tag = script
        .children(&mut cursor)
        .find(|child| child.kind() == "start_tag")?;

    let mut cursor = start_tag.walk();
    let attributes: Vec<Node<'_>> = start_tag
        .children(&mut cursor)
        .filter(|child| child.kind() == "attribute")
        .collect();

    attributes.into_iter().find_map(|attribute| {
        let mut cursor = attribute.walk();
        let parts: Vec<Node<'_>> = attribute.children(&mut cursor).collect();
        let name = parts.iter().find(|part| part.kind() == "attribute_name")?;
        if &source[name.byte_range()] != "lang" {
            return None;
        }
        let value = parts
            .iter()
            .find(|part| matches!(part.kind(), "attribute_value" | "quoted_attribute_value"))?;
        Some(source[value.byte_range()].trim_matches(|c| c == '"' || c == '\''))
    })
}

const FUNCTION_DEFINITIONS: &[&str] = &[
    "function_declaration",
    "function_definition",
    "function_item",
    "function_expression",
    "generator_function_declaration",
    "function_signature",
    "method_definition",
    "method_declaration",
    "method_signature",
];

const TYPE_DEFINITIONS: &[&str] = &[
    "class_declaration",
    "class_definition",
    "class",
    "interface_declaration",
    "struct_item",
    "enum_item",
    "trait_item",
];

const LITERALS: &[&str] = &[
    "true",
    "false",
    "null",
    "undefined",
    "nil",
    "none",
    "None",
    "True",
    "False",
    "boolean",
    "boolean_literal",
    "null_literal",
    "boolean_scalar",
    "null_scalar",
];

/// Scope for a node, without the `hljs-` prefix.
fn classify(node: Node<'_>, grammar: SupportLang) -> Option<&'static str> {
    if !node.is_named() {
        return classify_anonymous(node, grammar);
    }

    let kind = node.kind();
    if kind.contains("comment") {
        return Some("comment");
    }

    let parent = node.parent();
    let parent_kind = parent.map_or("", |parent| parent.kind());
    let is_field = |field: &str| {
        parent.is_some_and(|parent| parent.child_by_field_name(field) == Some(node))
    };

    match grammar {
        SupportLang::Html => {
            return match kind {
                "start_tag" | "end_tag" | "self_closing_tag" | "erroneous_end_tag" => Some("tag"),
                "tag_name" | "erroneous_end_tag_name" => Some("name"),
                "attribute_name" => Some("attr"),
                "quoted_attribute_value" => Some("string"),
                "attribute_value" if parent_kind != "quoted_attribute_value" => Some("string"),
                "doctype" => Some("meta"),
                "entity" => Some("symbol"),
                _ => None,
            };
        }
        SupportLang::Css => {
            return match kind {
                "tag_name" => Some("selector-tag"),
                "class_name" if parent_kind == "pseudo_class_selector" => Some("selector-pseudo"),
                "class_name" => Some("selector-class"),
                "id_name" => Some("selector-id"),
                "property_name" => Some("attribute"),
                "color_value" | "integer_value" | "float_value" => Some("number"),
                "string_value" => Some("string"),
                "at_keyword" | "important" => Some("keyword"),
                _ => None,
            };
        }
        _ => {}
    }

    if matches!(parent_kind, "pair" | "block_mapping_pair") && is_field("key") {
        return Some("attr");
    }
    if LITERALS.contains(&kind) {
        return Some("literal");
    }
    if is_string_kind(kind) {
        return Some("string");
    }
    if is_number_kind(kind) {
        return Some("number");
    }
    if FUNCTION_DEFINITIONS.contains(&parent_kind) && is_field("name") {
        return Some("title function_");
    }
    if TYPE_DEFINITIONS.contains(&parent_kind) && is_field("name") {
        return Some("title class_");
    }
    if parent_kind == "call_expression" && is_field("function") && kind == "identifier" {
        return Some("title function_");
    }

    match kind {
        "regex" | "regex_literal" => Some("regexp"),
        "this" | "self" | "super" => Some("variable language_"),
        "type_identifier" => Some("type"),
        "predefined_type" | "primitive_type" | "builtin_type" => Some("built_in"),
        "property_identifier" if parent_kind == "member_expression" => Some("property"),
        "decorator" | "attribute_item" | "preproc_include" | "preproc_def" => Some("meta"),
        _ => None,
    }
}

/// Keywords are the anonymous word tokens of a grammar.
fn classify_anonymous(node: Node<'_>, grammar: SupportLang) -> Option<&'static str> {
    let kind = node.kind();
    let word = kind.trim_start_matches('@');
    let is_word = word.starts_with(|c: char| c.is_ascii_alphabetic())
        && word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !is_word {
        return None;
    }

    // the word is already covered by a named parent's scope
    let parent_scoped = node
        .parent()
        .is_some_and(|parent| parent.is_named() && classify(parent, grammar).is_some());
    if parent_scoped {
        return None;
    }

    if LITERALS.contains(&kind) {
        Some("literal")
    } else {
        Some("keyword")
    }
}

fn is_string_kind(kind: &str) -> bool {
    matches!(
        kind,
        "string"
            | "template_string"
            | "char_literal"
            | "character_literal"
            | "rune_literal"
            | "double_quote_scalar"
            | "single_quote_scalar"
            | "block_scalar"
            | "heredoc_body"
    ) || kind.ends_with("string_literal")
}

fn is_number_kind(kind: &str) -> bool {
    matches!(
        kind,
        "number"
            | "integer"
            | "float"
            | "number_literal"
            | "integer_literal"
            | "float_literal"
            | "int_literal"
            | "real_literal"
            | "integer_scalar"
            | "float_scalar"
    ) || kind.ends_with("_integer_literal")
        || kind.ends_with("_floating_point_literal")
}
