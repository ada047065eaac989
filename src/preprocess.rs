//! The markup preprocessor.
//!
//! Every `<pre>` element annotated with `data-language` is replaced by its
//! formatted, highlighted code. All other text is left byte-for-byte
//! unchanged, and a source map relates the output back to the input.

use crate::diagnostic::{display_path, Diagnostic};
use crate::edit::{EditError, Splicer};
use crate::extract::extract;
use crate::filter::{should_process, IgnorePath};
use crate::language::{resolve, ResolvedLanguage, SupportedLanguages};
use crate::markup::{self, MarkupError, NodeKind, SyntaxNode};
use crate::sourcemap::SourceMap;
use crate::transform::{
    BlockReport, FormatOptions, FormatOverrides, Formatter, HighlightError, Highlighter,
    LayoutFormatter, Pipeline, TreeSitterHighlighter,
};
use std::path::PathBuf;
use thiserror::Error;

/// Element name of an embedded code block.
pub const CODE_BLOCK_TAG: &str = "pre";

/// Errors that abort processing of a whole file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("failed to parse markup: {0}")]
    Markup(#[from] MarkupError),

    #[error("failed to highlight code block at byte {byte_start}: {source}")]
    Highlight {
        byte_start: usize,
        #[source]
        source: HighlightError,
    },

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Caller configuration.
#[derive(Debug, Clone, Default)]
pub struct HighlightOptions {
    /// Replaces the default `node_modules`/`.svelte-kit` predicate.
    pub ignore_path: Option<IgnorePath>,
    /// Merged over the formatter defaults. The parser is always the block's
    /// language.
    pub formatter_options: FormatOverrides,
    /// Directory diagnostic paths are made relative to. Defaults to the
    /// working directory.
    pub base_dir: Option<PathBuf>,
}

/// One file handed over by the host.
#[derive(Debug, Clone, Copy)]
pub struct MarkupInput<'a> {
    pub content: &'a str,
    pub filename: Option<&'a str>,
}

impl<'a> MarkupInput<'a> {
    pub fn new(content: &'a str, filename: impl Into<Option<&'a str>>) -> Self {
        Self {
            content,
            filename: filename.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub code: String,
    pub map: SourceMap,
    pub diagnostics: Vec<Diagnostic>,
    pub blocks: Vec<BlockReport>,
}

/// Highlighting preprocessor.
///
/// Holds no per-file state; one instance can process any number of files,
/// from any number of threads.
pub struct Highlight {
    ignore_path: IgnorePath,
    format_options: FormatOptions,
    base_dir: Option<PathBuf>,
    formatter: Box<dyn Formatter>,
    highlighter: Box<dyn Highlighter>,
    languages: SupportedLanguages,
}

/// Create a preprocessor with the bundled formatter and highlighter.
pub fn highlight(options: HighlightOptions) -> Highlight {
    Highlight::new(options)
}

impl Highlight {
    pub fn new(options: HighlightOptions) -> Self {
        let highlighter = TreeSitterHighlighter;
        Self {
            ignore_path: options.ignore_path.unwrap_or_default(),
            format_options: options.formatter_options.resolve(),
            base_dir: options.base_dir,
            formatter: Box::new(LayoutFormatter),
            languages: SupportedLanguages::new(highlighter.languages()),
            highlighter: Box::new(highlighter),
        }
    }

    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Swap the highlighter. The supported language set follows it.
    pub fn with_highlighter(mut self, highlighter: impl Highlighter + 'static) -> Self {
        self.languages = SupportedLanguages::new(highlighter.languages());
        self.highlighter = Box::new(highlighter);
        self
    }

    pub fn languages(&self) -> &SupportedLanguages {
        &self.languages
    }

    /// Preprocess one file.
    ///
    /// Returns `Ok(None)` when the file is filtered out. Otherwise the
    /// result carries the rewritten text even when no block was annotated.
    pub fn markup(&self, input: MarkupInput<'_>) -> Result<Option<Processed>, PreprocessError> {
        if !should_process(input.filename, input.content, &self.ignore_path) {
            return Ok(None);
        }
        let filename = input.filename.unwrap_or_default();
        let file = display_path(filename, self.base_dir.as_deref());

        let root = markup::parse(input.content)?;
        let mut blocks = BlockProcessor {
            file: &file,
            languages: &self.languages,
            pipeline: Pipeline::new(
                self.formatter.as_ref(),
                self.highlighter.as_ref(),
                &self.format_options,
            ),
            splicer: Splicer::new(input.content),
            diagnostics: Vec::new(),
            reports: Vec::new(),
        };
        markup::walk(&root, &mut |node: &SyntaxNode| blocks.enter(node))?;

        let spliced = blocks.splicer.apply()?;
        log::debug!(
            "{file}: rewrote {} code block(s), {} diagnostic(s)",
            blocks.reports.len(),
            blocks.diagnostics.len()
        );
        let map = SourceMap::generate(&spliced.map, input.content, &spliced.code, filename, true);

        Ok(Some(Processed {
            code: spliced.code,
            map,
            diagnostics: blocks.diagnostics,
            blocks: blocks.reports,
        }))
    }
}

impl Default for Highlight {
    fn default() -> Self {
        Self::new(HighlightOptions::default())
    }
}

/// Per-file state while walking the tree.
struct BlockProcessor<'a> {
    file: &'a str,
    languages: &'a SupportedLanguages,
    pipeline: Pipeline<'a>,
    splicer: Splicer<'a>,
    diagnostics: Vec<Diagnostic>,
    reports: Vec<BlockReport>,
}

impl BlockProcessor<'_> {
    fn enter(&mut self, node: &SyntaxNode) -> Result<(), PreprocessError> {
        if node.kind != NodeKind::Element || node.name != CODE_BLOCK_TAG {
            return Ok(());
        }

        let resolved = resolve(node, self.languages);
        if resolved == ResolvedLanguage::Absent {
            return Ok(());
        }

        let Some(code) = extract(node).filter(|code| !code.is_empty()) else {
            self.report(Diagnostic::no_code(self.file));
            return Ok(());
        };

        let language = match &resolved {
            ResolvedLanguage::Invalid(language) => {
                let suggestion = self.languages.suggest(language);
                self.report(Diagnostic::invalid_language(self.file, language, suggestion));
                return Ok(());
            }
            other => match other.token() {
                Some(language) => language,
                None => return Ok(()),
            },
        };

        let transformed = self
            .pipeline
            .transform(code.source(), language)
            .map_err(|source| PreprocessError::Highlight {
                byte_start: node.start,
                source,
            })?;
        if let Some(error) = &transformed.format_error {
            self.report(Diagnostic::format_failed(self.file, error));
        }

        self.splicer
            .overwrite(node.start, node.end, transformed.markup.as_str())?;
        self.reports.push(transformed.report(node.start..node.end));
        Ok(())
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.diagnostics.push(diagnostic);
    }
}
