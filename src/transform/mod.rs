//! Transform pipeline: format, highlight, wrap.
//!
//! A formatting failure never aborts a block; the raw code is highlighted
//! instead and the error is handed back for reporting. Highlighting errors
//! propagate.

pub mod format;
pub mod highlight;

pub use format::{FormatError, FormatOptions, FormatOverrides, Formatter, LayoutFormatter};
pub use highlight::{HighlightError, Highlighted, Highlighter, TreeSitterHighlighter};

use crate::language::AUTO;
use std::borrow::Cow;
use std::ops::Range;

/// Class on the `<code>` element so highlight.js themes apply.
pub const WRAPPER_CLASS: &str = "hljs";

/// Detection candidates for component markup, which mixes three grammars.
pub const MARKUP_HINTS: &[&str] = &["xml", "css", "javascript"];

/// Result of transforming one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// Replacement markup for the whole `<pre>` element.
    pub markup: String,
    pub language: String,
    /// Language chosen by detection, or the explicit language's registered
    /// name.
    pub detected_language: Option<String>,
    /// Set when formatting failed and the raw code was highlighted.
    pub format_error: Option<FormatError>,
}

impl Transformed {
    /// Metadata for the block this result replaces.
    pub fn report(&self, span: Range<usize>) -> BlockReport {
        BlockReport {
            span,
            language: self.language.clone(),
            detected_language: self.detected_language.clone(),
        }
    }
}

/// Side-channel record of one rewritten block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReport {
    /// Byte range of the `<pre>` element in the original document.
    pub span: Range<usize>,
    /// Declared language token (`auto` for a valueless annotation).
    pub language: String,
    pub detected_language: Option<String>,
}

pub struct Pipeline<'a> {
    formatter: &'a dyn Formatter,
    highlighter: &'a dyn Highlighter,
    options: &'a FormatOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        formatter: &'a dyn Formatter,
        highlighter: &'a dyn Highlighter,
        options: &'a FormatOptions,
    ) -> Self {
        Self {
            formatter,
            highlighter,
            options,
        }
    }

    /// Format and highlight `code`, then wrap it. `code` is the decoded
    /// payload; it must be non-empty and `language` already validated.
    pub fn transform(&self, code: &str, language: &str) -> Result<Transformed, HighlightError> {
        let (code, format_error) = match self.formatter.format(code, language, self.options) {
            Ok(formatted) => (Cow::Owned(formatted), None),
            Err(err) => (Cow::Borrowed(code), Some(err)),
        };

        let highlighted = if language == AUTO {
            self.highlighter.highlight_auto(&code, None)?
        } else if is_markup_language(language) {
            self.highlighter.highlight_auto(&code, Some(MARKUP_HINTS))?
        } else {
            self.highlighter.highlight(&code, language)?
        };

        Ok(Transformed {
            markup: wrap(&highlighted.value),
            language: language.to_string(),
            detected_language: highlighted.language,
            format_error,
        })
    }
}

/// Component dialects highlighted by detection over [`MARKUP_HINTS`].
pub fn is_markup_language(language: &str) -> bool {
    let language = language.to_ascii_lowercase();
    language.contains("svelte") || language.contains("html")
}

/// Embed highlighted HTML as a raw-HTML tag inside `<pre><code>`.
///
/// The markup is not re-escaped as HTML. Template-literal syntax is escaped
/// exactly once, so the literal evaluates to `highlighted` itself.
pub fn wrap(highlighted: &str) -> String {
    format!(
        "<pre><code class=\"{WRAPPER_CLASS}\">{{@html `{}`}}</code></pre>",
        escape_template_literal(highlighted)
    )
}

/// Escape the characters that end or interpolate a template literal.
fn escape_template_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records which entry point was used and echoes the code.
    #[derive(Default)]
    struct RecordingHighlighter {
        calls: Mutex<Vec<String>>,
    }

    impl Highlighter for RecordingHighlighter {
        fn languages(&self) -> Vec<String> {
            vec!["typescript".to_string()]
        }

        fn highlight(&self, code: &str, language: &str) -> Result<Highlighted, HighlightError> {
            self.calls.lock().unwrap().push(format!("explicit:{language}"));
            Ok(Highlighted {
                value: code.to_string(),
                language: Some(language.to_string()),
                relevance: 1,
            })
        }

        fn highlight_auto(
            &self,
            code: &str,
            subset: Option<&[&str]>,
        ) -> Result<Highlighted, HighlightError> {
            let subset = subset.map_or("*".to_string(), |names| names.join(","));
            self.calls.lock().unwrap().push(format!("auto:{subset}"));
            Ok(Highlighted {
                value: code.to_string(),
                language: None,
                relevance: 0,
            })
        }
    }

    fn failing(_: &str, _: &str, _: &FormatOptions) -> Result<String, FormatError> {
        Err(FormatError {
            message: "boom".to_string(),
            code_frame: Some("> 1 | x".to_string()),
        })
    }

    #[test]
    fn wraps_with_class_marker() {
        assert_eq!(
            wrap("<span class=\"hljs-keyword\">let</span>"),
            "<pre><code class=\"hljs\">{@html `<span class=\"hljs-keyword\">let</span>`}</code></pre>"
        );
    }

    #[test]
    fn wrap_escapes_template_literal_syntax() {
        assert_eq!(
            wrap("a`b\\c${d}$e"),
            "<pre><code class=\"hljs\">{@html `a\\`b\\\\c\\${d}$e`}</code></pre>"
        );
    }

    #[test]
    fn dispatches_by_language() {
        let highlighter = RecordingHighlighter::default();
        let options = FormatOptions::default();
        let pipeline = Pipeline::new(&LayoutFormatter, &highlighter, &options);

        pipeline.transform("x", "auto").unwrap();
        pipeline.transform("<p>x</p>", "svelte").unwrap();
        pipeline.transform("<p>x</p>", "html").unwrap();
        pipeline.transform("let a = 1", "typescript").unwrap();

        assert_eq!(
            *highlighter.calls.lock().unwrap(),
            vec![
                "auto:*",
                "auto:xml,css,javascript",
                "auto:xml,css,javascript",
                "explicit:typescript",
            ]
        );
    }

    #[test]
    fn format_failure_falls_back_to_raw_code() {
        let highlighter = RecordingHighlighter::default();
        let options = FormatOptions::default();
        let pipeline = Pipeline::new(&failing, &highlighter, &options);

        let transformed = pipeline.transform("  raw  ", "typescript").unwrap();
        assert_eq!(
            transformed.markup,
            "<pre><code class=\"hljs\">{@html `  raw  `}</code></pre>"
        );
        let err = transformed.format_error.unwrap();
        assert_eq!(err.message, "boom");
        assert_eq!(err.code_frame.as_deref(), Some("> 1 | x"));
    }

    #[test]
    fn formatted_code_is_highlighted() {
        let highlighter = RecordingHighlighter::default();
        let options = FormatOptions::default();
        let pipeline = Pipeline::new(&LayoutFormatter, &highlighter, &options);

        let transformed = pipeline
            .transform("const a= (b:number) =>4", "typescript")
            .unwrap();
        assert_eq!(
            transformed.markup,
            wrap("const a = (b: number) => 4")
        );
        assert!(transformed.format_error.is_none());
        assert_eq!(transformed.detected_language.as_deref(), Some("typescript"));
    }

    #[test]
    fn unknown_explicit_language_propagates() {
        let options = FormatOptions::default();
        let pipeline = Pipeline::new(&LayoutFormatter, &TreeSitterHighlighter, &options);
        assert_eq!(
            pipeline.transform("x", "nope").unwrap_err(),
            HighlightError::UnknownLanguage("nope".to_string())
        );
    }

    #[test]
    fn markup_language_test_ignores_case() {
        assert!(is_markup_language("Svelte"));
        assert!(is_markup_language("xhtml"));
        assert!(!is_markup_language("xml"));
    }
}
