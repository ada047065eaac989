//! Svelte Highlight Preprocess: build-time code highlighting for components
//!
//! Rewrites every `<pre data-language="...">` element whose only payload is
//! an interpolated string or template literal into pre-rendered, formatted
//! and syntax-highlighted HTML, so pages ship highlighted code without a
//! client-side highlighter.
//!
//! # Architecture
//!
//! Processing one file is a fixed pipeline:
//!
//! 1. [`filter`] decides whether the file is processed at all.
//! 2. [`markup`] parses the component into a tree and walks it.
//! 3. For each annotated `<pre>`, [`language`] resolves the declared
//!    language and [`extract`] pulls out the code.
//! 4. [`transform`] formats, highlights and wraps the code.
//! 5. [`edit`] splices the replacements into the original text by original
//!    byte offsets, and [`sourcemap`] maps the output back to the input.
//!
//! Problems with individual blocks are reported as [`Diagnostic`]s and never
//! abort the file; only malformed markup or a highlighter failure does.
//!
//! # Example
//!
//! ```no_run
//! use svelte_highlight_preprocess::{highlight, HighlightOptions, MarkupInput};
//!
//! let preprocessor = highlight(HighlightOptions::default());
//! let input = MarkupInput::new(
//!     r#"<pre data-language="typescript">{'const a= (b:number) =>4'}</pre>"#,
//!     "src/App.svelte",
//! );
//!
//! match preprocessor.markup(input) {
//!     Ok(Some(processed)) => println!("{}", processed.code),
//!     Ok(None) => println!("skipped"),
//!     Err(e) => eprintln!("preprocessing failed: {}", e),
//! }
//! ```

pub mod config;
pub mod diagnostic;
pub mod edit;
pub mod extract;
pub mod filter;
pub mod language;
pub mod markup;
pub mod preprocess;
pub mod sourcemap;
pub mod transform;
pub mod ts;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, HighlightConfig};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use edit::{Edit, EditError, PositionMap, Splicer};
pub use filter::{should_process, IgnorePath};
pub use language::{ResolvedLanguage, SupportedLanguages};
pub use markup::{MarkupError, SyntaxNode};
pub use preprocess::{
    highlight, Highlight, HighlightOptions, MarkupInput, PreprocessError, Processed,
};
pub use sourcemap::SourceMap;
pub use transform::{
    BlockReport, FormatError, FormatOptions, FormatOverrides, Formatter, HighlightError,
    Highlighted, Highlighter, LayoutFormatter, TreeSitterHighlighter,
};
pub use ts::TreeSitterError;
