//! Code payload extraction from an annotated `<pre>` element.

use crate::markup::{Expression, SyntaxNode};

/// Code payload of a block, in the form it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code<'a> {
    /// Decoded value of a quoted string.
    Literal(&'a str),
    /// First fragment of a template literal.
    Template { raw: &'a str, cooked: &'a str },
}

impl<'a> Code<'a> {
    /// Text as it appears in the payload: the string value, or the
    /// template fragment with its escapes untouched.
    pub fn raw(&self) -> &'a str {
        match self {
            Self::Literal(value) => value,
            Self::Template { raw, .. } => raw,
        }
    }

    /// The code the author wrote, with template escapes decoded.
    pub fn source(&self) -> &'a str {
        match self {
            Self::Literal(value) => value,
            Self::Template { cooked, .. } => cooked,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }
}

/// Code of the element's first interpolation.
///
/// A string literal yields its decoded value; a template literal yields its
/// first fragment. Any other expression, or no interpolation at all, yields
/// `None`. The text is returned untrimmed.
pub fn extract(node: &SyntaxNode) -> Option<Code<'_>> {
    match node.first_interpolation()? {
        Expression::Literal { value } => Some(Code::Literal(value)),
        Expression::Template { quasis } => quasis.first().map(|quasi| Code::Template {
            raw: &quasi.raw,
            cooked: &quasi.cooked,
        }),
        Expression::Other { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    fn extract_first(source: &str) -> Option<String> {
        let root = parse(source).unwrap();
        let pre = root.child_nodes().next().unwrap();
        extract(pre).map(|code| code.raw().to_string())
    }

    #[test]
    fn string_literal_value() {
        assert_eq!(
            extract_first(r#"<pre data-language="typescript">{'const a = "\n"'}</pre>"#),
            Some("const a = \"\n\"".to_string())
        );
    }

    #[test]
    fn first_template_fragment_untrimmed() {
        assert_eq!(
            extract_first("<pre>\n  {`\n  let a = 1;\n  `}\n</pre>"),
            Some("\n  let a = 1;\n  ".to_string())
        );
        assert_eq!(
            extract_first("<pre>{`a ${b} c`}</pre>"),
            Some("a ".to_string())
        );
    }

    #[test]
    fn template_raw_keeps_escapes() {
        assert_eq!(
            extract_first(r"<pre>{`a\nb`}</pre>"),
            Some(r"a\nb".to_string())
        );
    }

    #[test]
    fn template_source_is_cooked() {
        let root = parse(r"<pre>{`a\`b\`\${c}`}</pre>").unwrap();
        let code = extract(root.child_nodes().next().unwrap()).unwrap();
        assert_eq!(code.raw(), r"a\`b\`\${c}");
        assert_eq!(code.source(), "a`b`${c}");

        let root = parse(r"<pre>{'a\'b'}</pre>").unwrap();
        let code = extract(root.child_nodes().next().unwrap()).unwrap();
        assert_eq!(code, Code::Literal("a'b"));
        assert_eq!(code.source(), code.raw());
    }

    #[test]
    fn missing_or_dynamic_payload() {
        assert_eq!(extract_first("<pre data-language=\"typescript\" />"), None);
        assert_eq!(extract_first("<pre>{code}</pre>"), None);
        assert_eq!(extract_first("<pre>plain text</pre>"), None);
    }

    #[test]
    fn empty_string_is_found_but_empty() {
        assert_eq!(extract_first("<pre>{''}</pre>"), Some(String::new()));
    }
}
