//! Code formatting stage.
//!
//! [`Formatter`] is the seam a host swaps a real formatter into. The bundled
//! [`LayoutFormatter`] normalises layout, validates the block against its
//! grammar, and re-spaces tokens for JavaScript and TypeScript.

use crate::ts::{
    check_parsed, code_frame, is_markup_grammar, parser_grammar, SourceParser, SupportLang,
    TreeSitterError,
};
use serde::Deserialize;
use thiserror::Error;
use tree_sitter::Node;

/// Formats one block of code with the named parser.
pub trait Formatter: Send + Sync {
    fn format(&self, code: &str, parser: &str, options: &FormatOptions)
        -> Result<String, FormatError>;
}

impl<F> Formatter for F
where
    F: Fn(&str, &str, &FormatOptions) -> Result<String, FormatError> + Send + Sync,
{
    fn format(
        &self,
        code: &str,
        parser: &str,
        options: &FormatOptions,
    ) -> Result<String, FormatError> {
        self(code, parser, options)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FormatError {
    pub message: String,
    /// Source excerpt pointing at the failure, when the position is known.
    pub code_frame: Option<String>,
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code_frame: None,
        }
    }

    /// Describe a syntax error in `source` with a code frame; other parser
    /// failures keep their own message.
    fn syntax(source: &str, err: TreeSitterError) -> Self {
        match err {
            TreeSitterError::SyntaxError {
                byte_start,
                byte_end,
                line,
                column,
            } => Self {
                message: format!("SyntaxError: Unexpected token ({line}:{column})"),
                code_frame: Some(code_frame(source, byte_start, byte_end)),
            },
            other => other.into(),
        }
    }
}

impl From<TreeSitterError> for FormatError {
    fn from(err: TreeSitterError) -> Self {
        Self::new(err.to_string())
    }
}

/// Effective formatter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub tab_width: usize,
    pub use_tabs: bool,
    pub normalize_spacing: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            tab_width: 2,
            use_tabs: false,
            normalize_spacing: true,
        }
    }
}

/// User-supplied settings; unset fields keep the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatOverrides {
    pub tab_width: Option<usize>,
    pub use_tabs: Option<bool>,
    pub normalize_spacing: Option<bool>,
}

impl FormatOverrides {
    pub fn resolve(&self) -> FormatOptions {
        let defaults = FormatOptions::default();
        FormatOptions {
            tab_width: self.tab_width.unwrap_or(defaults.tab_width),
            use_tabs: self.use_tabs.unwrap_or(defaults.use_tabs),
            normalize_spacing: self.normalize_spacing.unwrap_or(defaults.normalize_spacing),
        }
    }
}

/// Grammar-aware formatter built on the bundled tree-sitter grammars.
#[derive(Debug, Default, Clone, Copy)]
pub struct LayoutFormatter;

impl Formatter for LayoutFormatter {
    fn format(
        &self,
        code: &str,
        parser: &str,
        options: &FormatOptions,
    ) -> Result<String, FormatError> {
        let laid_out = normalize_layout(code, options);

        let Some(grammar) = parser_grammar(parser) else {
            return Ok(laid_out);
        };
        if is_markup_grammar(grammar) {
            return Ok(laid_out);
        }

        let mut source_parser = SourceParser::new(grammar)?;
        let parsed = source_parser.parse_with_source(&laid_out)?;
        check_parsed(&parsed).map_err(|err| FormatError::syntax(&laid_out, err))?;

        if options.normalize_spacing && is_script_grammar(grammar) {
            return Ok(respace(&laid_out, parsed.root_node()));
        }
        Ok(laid_out)
    }
}

fn is_script_grammar(grammar: SupportLang) -> bool {
    matches!(grammar, SupportLang::JavaScript | SupportLang::TypeScript)
}

/// Trim surrounding blank lines and trailing whitespace, dedent, collapse
/// blank runs, and re-indent with the configured unit.
fn normalize_layout(code: &str, options: &FormatOptions) -> String {
    let tab_width = options.tab_width.max(1);
    let lines: Vec<&str> = code.lines().map(str::trim_end).collect();

    let Some(first) = lines.iter().position(|line| !line.is_empty()) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .unwrap_or(first);
    let body = &lines[first..=last];

    let common = body
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| split_indent(line, tab_width).0)
        .min()
        .unwrap_or(0);

    let mut out = Vec::with_capacity(body.len());
    let mut previous_blank = false;
    for line in body {
        if line.is_empty() {
            if !previous_blank {
                out.push(String::new());
            }
            previous_blank = true;
            continue;
        }
        previous_blank = false;

        let (width, rest) = split_indent(line, tab_width);
        out.push(format!("{}{}", render_indent(width - common, options), rest));
    }

    out.join("\n")
}

/// Indentation width in columns and the remainder of the line.
fn split_indent(line: &str, tab_width: usize) -> (usize, &str) {
    let mut width = 0;
    for (index, ch) in line.char_indices() {
        match ch {
            ' ' => width += 1,
            '\t' => width += tab_width,
            _ => return (width, &line[index..]),
        }
    }
    (width, "")
}

fn render_indent(width: usize, options: &FormatOptions) -> String {
    if options.use_tabs {
        let tab_width = options.tab_width.max(1);
        format!(
            "{}{}",
            "\t".repeat(width / tab_width),
            " ".repeat(width % tab_width)
        )
    } else {
        " ".repeat(width)
    }
}

/// Token kinds kept verbatim, including their interior.
const ATOMIC_KINDS: &[&str] = &[
    "string",
    "template_string",
    "comment",
    "regex",
    "number",
    "jsx_element",
    "jsx_self_closing_element",
];

const ALWAYS_SPACED: &[&str] = &[
    "=", "==", "===", "!=", "!==", "=>", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=",
    ">>>=", "&=", "|=", "^=", "&&=", "||=", "??=", "&&", "||", "??",
];

const BINARY_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "**", "<", ">", "<=", ">=", "<<", ">>", ">>>", "&", "|", "^",
    "instanceof", "in",
];

/// Rewrite the whitespace between tokens that share a line.
fn respace(source: &str, root: Node<'_>) -> String {
    let mut tokens = Vec::new();
    collect_tokens(root, &mut tokens);

    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return source.to_string();
    };

    let mut out = String::with_capacity(source.len());
    out.push_str(&source[..first.start_byte()]);
    out.push_str(&source[first.byte_range()]);

    for pair in tokens.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        let Some(gap) = source.get(left.end_byte()..right.start_byte()) else {
            return source.to_string();
        };
        if gap.contains('\n') || !gap.trim().is_empty() {
            out.push_str(gap);
        } else {
            out.push_str(spacing(left, right, gap));
        }
        out.push_str(&source[right.byte_range()]);
    }

    out.push_str(&source[last.end_byte()..]);
    out
}

fn collect_tokens<'t>(node: Node<'t>, tokens: &mut Vec<Node<'t>>) {
    if node.child_count() == 0 || ATOMIC_KINDS.contains(&node.kind()) {
        if node.end_byte() > node.start_byte() {
            tokens.push(node);
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_tokens(child, tokens);
    }
}

fn spacing(left: Node<'_>, right: Node<'_>, gap: &str) -> &'static str {
    let (l, r) = (left.kind(), right.kind());

    if matches!(r, ")" | "]" | "," | ";") {
        return "";
    }
    if matches!(r, "." | "?.") {
        // `1 .toString()` needs its space
        return if l == "number" { keep(gap) } else { "" };
    }
    if matches!(l, "(" | "[" | "." | "?.") {
        return "";
    }
    if r == ":" {
        return if parent_kind(right) == "ternary_expression" {
            " "
        } else {
            ""
        };
    }
    if matches!(l, ":" | ",") {
        return " ";
    }
    if l == ";" && parent_kind(left).starts_with("for") {
        return " ";
    }
    if is_spaced_operator(left) || is_spaced_operator(right) {
        return " ";
    }
    keep(gap)
}

fn keep(gap: &str) -> &'static str {
    if gap.is_empty() {
        ""
    } else {
        " "
    }
}

fn is_spaced_operator(node: Node<'_>) -> bool {
    if node.is_named() {
        return false;
    }
    let kind = node.kind();
    if ALWAYS_SPACED.contains(&kind) {
        return true;
    }
    let parent = parent_kind(node);
    match kind {
        "?" => parent == "ternary_expression",
        "|" | "&" if matches!(parent, "union_type" | "intersection_type") => true,
        _ => BINARY_OPERATORS.contains(&kind) && parent == "binary_expression",
    }
}

fn parent_kind(node: Node<'_>) -> &'static str {
    node.parent().map_or("", |parent| parent.kind())
}
