use crate::markup::ast::{
    Attribute, AttributeChunk, AttributeValue, Child, Expression, Interpolation, NodeKind,
    SyntaxNode, TemplateElement,
};
use crate::markup::errors::MarkupError;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Elements whose content is kept verbatim instead of being parsed as markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Parse component markup into a tree rooted at a [`NodeKind::Fragment`].
pub fn parse(source: &str) -> Result<SyntaxNode, MarkupError> {
    MarkupParser::new(source).parse()
}

/// Hand-written parser for component markup.
///
/// Produces elements, text, comments, interpolations and special tags with
/// byte spans into the original text. Block tags (`{#if}`, `{/if}`) are
/// kept as flat [`NodeKind::Tag`] siblings.
pub struct MarkupParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> MarkupParser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    pub fn parse(mut self) -> Result<SyntaxNode, MarkupError> {
        let mut stack = vec![SyntaxNode::new(NodeKind::Fragment, 0, self.source.len(), "")];

        while self.pos < self.bytes.len() {
            if self.starts_with("<!--") {
                let comment = self.parse_comment()?;
                push_child(&mut stack, Child::Node(comment));
            } else if self.starts_with("</") {
                self.parse_closing_tag(&mut stack)?;
            } else if self.at_tag_open() {
                let (element, open) = self.parse_open_tag()?;
                if open {
                    stack.push(element);
                } else {
                    push_child(&mut stack, Child::Node(element));
                }
            } else if self.peek() == Some(b'{') {
                let child = self.parse_mustache()?;
                push_child(&mut stack, child);
            } else {
                let text = self.parse_text();
                push_child(&mut stack, Child::Node(text));
            }
        }

        if stack.len() > 1 {
            let unclosed = stack.pop().expect("stack has more than one entry");
            return Err(MarkupError::UnclosedElement {
                name: unclosed.name,
                byte_start: unclosed.start,
            });
        }

        Ok(stack.pop().expect("root fragment is never popped"))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.bytes[self.pos..].starts_with(prefix.as_bytes())
    }

    fn at_tag_open(&self) -> bool {
        self.peek() == Some(b'<') && self.peek_at(1).is_some_and(|b| b.is_ascii_alphabetic())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_comment(&mut self) -> Result<SyntaxNode, MarkupError> {
        let start = self.pos;
        let body = start + "<!--".len();
        let close = self.source[body..]
            .find("-->")
            .ok_or(MarkupError::Unterminated {
                construct: "comment",
                byte_start: start,
            })?;
        self.pos = body + close + "-->".len();
        Ok(SyntaxNode::new(NodeKind::Comment, start, self.pos, ""))
    }

    fn parse_text(&mut self) -> SyntaxNode {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek() {
            if b == b'{' || self.at_tag_open() || self.starts_with("</") || self.starts_with("<!--")
            {
                break;
            }
            self.pos += 1;
        }
        SyntaxNode::new(NodeKind::Text, start, self.pos, "")
    }

    fn parse_tag_name(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !b.is_ascii_whitespace() && b != b'/' && b != b'>')
        {
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    /// Parse `<name attrs...>` or `<name ... />`.
    ///
    /// Returns the element and whether it stays open for children.
    fn parse_open_tag(&mut self) -> Result<(SyntaxNode, bool), MarkupError> {
        let start = self.pos;
        self.pos += 1;
        let name = self.parse_tag_name().to_string();
        let mut element = SyntaxNode::new(NodeKind::Element, start, start, name.clone());

        let self_closing = loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(MarkupError::Unterminated {
                        construct: "tag",
                        byte_start: start,
                    })
                }
                Some(b'>') => {
                    self.pos += 1;
                    break false;
                }
                Some(b'/') if self.peek_at(1) == Some(b'>') => {
                    self.pos += 2;
                    break true;
                }
                Some(b'/') => self.pos += 1,
                Some(_) => {
                    let attribute = self.parse_attribute()?;
                    element.attributes.push(attribute);
                }
            }
        };

        let lowercase = name.to_ascii_lowercase();
        if self_closing || VOID_ELEMENTS.contains(&lowercase.as_str()) {
            element.end = self.pos;
            return Ok((element, false));
        }

        if RAW_TEXT_ELEMENTS.contains(&lowercase.as_str()) {
            self.parse_raw_text_content(&mut element, &lowercase)?;
            return Ok((element, false));
        }

        Ok((element, true))
    }

    fn parse_raw_text_content(
        &mut self,
        element: &mut SyntaxNode,
        lowercase_name: &str,
    ) -> Result<(), MarkupError> {
        let content_start = self.pos;
        let needle = format!("</{lowercase_name}");
        let close = self.source[content_start..]
            .to_ascii_lowercase()
            .find(&needle)
            .ok_or_else(|| MarkupError::UnclosedElement {
                name: element.name.clone(),
                byte_start: element.start,
            })?;
        let content_end = content_start + close;
        if content_end > content_start {
            element.children.push(Child::Node(SyntaxNode::new(
                NodeKind::Text,
                content_start,
                content_end,
                "",
            )));
        }

        self.pos = content_end + needle.len();
        self.skip_whitespace();
        if self.peek() != Some(b'>') {
            return Err(MarkupError::Expected {
                expected: "'>'",
                byte_start: self.pos,
            });
        }
        self.pos += 1;
        element.end = self.pos;
        Ok(())
    }

    fn parse_attribute(&mut self) -> Result<Attribute, MarkupError> {
        let start = self.pos;

        if self.peek() == Some(b'{') {
            let (expression, raw) = self.parse_braced_expression()?;
            return Ok(Attribute {
                name: raw.trim().to_string(),
                start,
                end: self.pos,
                value: AttributeValue::Literal(vec![AttributeChunk::Expression(expression)]),
            });
        }

        while self.peek().is_some_and(|b| {
            !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/'
        }) {
            self.pos += 1;
        }
        // a lone `/` inside a name (e.g. `a/b`) is not the end of the tag
        while self.peek() == Some(b'/') && self.peek_at(1) != Some(b'>') {
            self.pos += 1;
            while self.peek().is_some_and(|b| {
                !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/'
            }) {
                self.pos += 1;
            }
        }
        let name = self.source[start..self.pos].to_string();
        if name.is_empty() {
            return Err(MarkupError::Expected {
                expected: "attribute name",
                byte_start: start,
            });
        }

        let checkpoint = self.pos;
        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            self.pos = checkpoint;
            return Ok(Attribute {
                name,
                start,
                end: self.pos,
                value: AttributeValue::Present,
            });
        }
        self.pos += 1;
        self.skip_whitespace();

        let chunks = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => self.parse_quoted_value(quote)?,
            Some(b'{') => {
                let (expression, _) = self.parse_braced_expression()?;
                vec![AttributeChunk::Expression(expression)]
            }
            Some(_) => {
                let value_start = self.pos;
                while self.peek().is_some_and(|b| {
                    !b.is_ascii_whitespace() && b != b'>' && !(b == b'/' && self.peek_at(1) == Some(b'>'))
                }) {
                    self.pos += 1;
                }
                vec![AttributeChunk::Text {
                    raw: self.source[value_start..self.pos].to_string(),
                }]
            }
            None => {
                return Err(MarkupError::Unterminated {
                    construct: "attribute value",
                    byte_start: start,
                })
            }
        };

        Ok(Attribute {
            name,
            start,
            end: self.pos,
            value: AttributeValue::Literal(chunks),
        })
    }

    fn parse_quoted_value(&mut self, quote: u8) -> Result<Vec<AttributeChunk>, MarkupError> {
        let open = self.pos;
        self.pos += 1;
        let mut chunks = Vec::new();
        let mut text_start = self.pos;

        loop {
            match self.peek() {
                None => {
                    return Err(MarkupError::Unterminated {
                        construct: "attribute value",
                        byte_start: open,
                    })
                }
                Some(b) if b == quote => {
                    if self.pos > text_start || chunks.is_empty() {
                        chunks.push(AttributeChunk::Text {
                            raw: self.source[text_start..self.pos].to_string(),
                        });
                    }
                    self.pos += 1;
                    return Ok(chunks);
                }
                Some(b'{') => {
                    if self.pos > text_start {
                        chunks.push(AttributeChunk::Text {
                            raw: self.source[text_start..self.pos].to_string(),
                        });
                    }
                    let (expression, _) = self.parse_braced_expression()?;
                    chunks.push(AttributeChunk::Expression(expression));
                    text_start = self.pos;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Parse `{...}` at the current position, returning the expression and
    /// its inner source text.
    fn parse_braced_expression(&mut self) -> Result<(Expression, &'a str), MarkupError> {
        let open = self.pos;
        let close = closing_brace(self.source, open + 1).ok_or(MarkupError::Unterminated {
            construct: "expression",
            byte_start: open,
        })?;
        let inner = &self.source[open + 1..close];
        self.pos = close + 1;
        Ok((classify_expression(inner.trim()), inner))
    }

    fn parse_mustache(&mut self) -> Result<Child, MarkupError> {
        let start = self.pos;
        let (expression, inner) = self.parse_braced_expression()?;
        let trimmed = inner.trim_start();

        if trimmed.starts_with(['#', ':', '/', '@']) {
            let name: String = trimmed
                .chars()
                .take_while(|c| !c.is_whitespace())
                .collect();
            return Ok(Child::Node(SyntaxNode::new(
                NodeKind::Tag,
                start,
                self.pos,
                name,
            )));
        }

        Ok(Child::Interpolation(Interpolation {
            start,
            end: self.pos,
            expression,
        }))
    }

    fn parse_closing_tag(&mut self, stack: &mut Vec<SyntaxNode>) -> Result<(), MarkupError> {
        let start = self.pos;
        self.pos += 2;
        let name = self.parse_tag_name().to_string();
        if name.is_empty() {
            return Err(MarkupError::Expected {
                expected: "tag name",
                byte_start: self.pos,
            });
        }
        self.skip_whitespace();
        if self.peek() != Some(b'>') {
            return Err(MarkupError::Unterminated {
                construct: "closing tag",
                byte_start: start,
            });
        }
        self.pos += 1;

        let depth = stack
            .iter()
            .skip(1)
            .rposition(|open| open.kind == NodeKind::Element && open.name == name)
            .map(|index| index + 1)
            .ok_or_else(|| MarkupError::UnexpectedClosingTag {
                name: name.clone(),
                byte_start: start,
            })?;

        // elements left open inside the closed one end where it closes
        while stack.len() > depth + 1 {
            let mut implicit = stack.pop().expect("stack deeper than target");
            implicit.end = start;
            push_child(stack, Child::Node(implicit));
        }

        let mut element = stack.pop().expect("target element is on the stack");
        element.end = self.pos;
        push_child(stack, Child::Node(element));
        Ok(())
    }
}

fn push_child(stack: &mut [SyntaxNode], child: Child) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(child);
    }
}

/// Classify a trimmed expression as a string literal, template literal, or
/// other code.
pub fn classify_expression(expr: &str) -> Expression {
    match expr.as_bytes().first() {
        Some(b'\'' | b'"') if string_end(expr, 0) == Some(expr.len()) => Expression::Literal {
            value: unescape(&expr[1..expr.len() - 1]),
        },
        Some(b'`') if template_end(expr, 0) == Some(expr.len()) => Expression::Template {
            quasis: template_quasis(expr),
        },
        _ => Expression::Other {
            raw: expr.to_string(),
        },
    }
}

/// Index of the `}` closing a brace opened just before `from`.
///
/// Understands quoted strings, template literals, comments and nested
/// brackets.
fn closing_brace(source: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut i = from;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => i = string_end(source, i)?,
            b'`' => i = template_end(source, i)?,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = source[i..].find('\n').map_or(bytes.len(), |n| i + n + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = i + 2 + source[i + 2..].find("*/")? + 2;
            }
            b'{' | b'(' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' if depth == 0 => return Some(i),
            b'}' | b')' | b']' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            _ => i += 1,
        }
    }

    None
}

/// Index just past the string literal whose opening quote is at `start`.
fn string_end(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let quote = bytes[start];
    let mut i = start + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }

    None
}

/// Index just past the template literal whose backtick is at `start`.
fn template_end(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut i = start + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            b'$' if bytes.get(i + 1) == Some(&b'{') => i = closing_brace(source, i + 2)? + 1,
            _ => i += 1,
        }
    }

    None
}

/// Split a complete template literal into its static fragments.
fn template_quasis(literal: &str) -> Vec<TemplateElement> {
    let bytes = literal.as_bytes();
    let mut quasis = Vec::new();
    let mut fragment_start = 1;
    let mut i = 1;
    let end = literal.len() - 1;

    while i < end {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                quasis.push(template_element(&literal[fragment_start..i]));
                i = closing_brace(literal, i + 2).map_or(end, |close| close + 1);
                fragment_start = i;
            }
            _ => i += 1,
        }
    }

    quasis.push(template_element(&literal[fragment_start.min(end)..end]));
    quasis
}

fn template_element(raw: &str) -> TemplateElement {
    TemplateElement {
        raw: raw.to_string(),
        cooked: unescape(raw),
    }
}

/// Decode the escape sequences of a string or template literal body.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, u32::from_str_radix(&hex, 16).ok());
            }
            Some('u') => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    u32::from_str_radix(&hex, 16).ok()
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    u32::from_str_radix(&hex, 16).ok()
                };
                push_code_point(&mut out, code);
            }
            // line continuation
            Some('\n') => {}
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

fn push_code_point(out: &mut String, code: Option<u32>) {
    out.push(
        code.and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER),
    );
}
