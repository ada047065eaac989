//! Resolution of the `data-language` annotation.

use crate::markup::{AttributeChunk, AttributeValue, SyntaxNode};
use std::collections::BTreeSet;

/// Attribute that marks a `<pre>` element as a code block.
pub const LANGUAGE_ATTRIBUTE: &str = "data-language";

/// Language token for highlighter auto-detection.
pub const AUTO: &str = "auto";

/// Tokens accepted in addition to the highlighter's own languages.
const ALWAYS_SUPPORTED: &[&str] = &["svelte", "html", AUTO];

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLanguage {
    /// No annotation; the element is ordinary markup.
    Absent,
    /// `data-language` with no value.
    Auto,
    Explicit(String),
    Invalid(String),
}

impl ResolvedLanguage {
    /// The language token a valid annotation resolves to.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Auto => Some(AUTO),
            Self::Explicit(language) => Some(language),
            Self::Absent | Self::Invalid(_) => None,
        }
    }
}

/// The set of language tokens a block may declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedLanguages {
    names: BTreeSet<String>,
}

impl SupportedLanguages {
    /// Build the set from the highlighter's registered languages plus
    /// `svelte`, `html` and `auto`.
    pub fn new<I, S>(registered: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: BTreeSet<String> = registered.into_iter().map(Into::into).collect();
        names.extend(ALWAYS_SUPPORTED.iter().map(|name| name.to_string()));
        Self { names }
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, language: &str) -> bool {
        self.names.contains(language)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Closest supported token to a rejected one, if any is close enough.
    pub fn suggest(&self, language: &str) -> Option<&str> {
        let language = language.to_ascii_lowercase();
        self.iter()
            .map(|candidate| (candidate, strsim::jaro_winkler(&language, candidate)))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate)
    }
}

/// Resolve the language annotation of `node`.
///
/// A present attribute whose first value chunk is empty or dynamic
/// (`data-language={lang}`) is treated as no annotation.
pub fn resolve(node: &SyntaxNode, supported: &SupportedLanguages) -> ResolvedLanguage {
    let Some(attribute) = node.attribute(LANGUAGE_ATTRIBUTE) else {
        return ResolvedLanguage::Absent;
    };

    let chunks = match &attribute.value {
        AttributeValue::Present => return ResolvedLanguage::Auto,
        AttributeValue::Literal(chunks) => chunks,
    };

    match chunks.first() {
        Some(AttributeChunk::Text { raw }) if !raw.is_empty() => {
            if supported.contains(raw) {
                ResolvedLanguage::Explicit(raw.clone())
            } else {
                ResolvedLanguage::Invalid(raw.clone())
            }
        }
        _ => ResolvedLanguage::Absent,
    }
}
