//! Tree-sitter integration for the grammars code blocks are written in.
//!
//! Provides the language registry, a parser wrapper over the grammars
//! bundled with ast-grep-language, and syntax validation with code-frame
//! rendering for formatter diagnostics.

pub mod errors;
pub mod lang;
pub mod parser;
pub mod validator;

pub use errors::TreeSitterError;
pub use lang::{
    find_language, is_markup_grammar, language_names, parser_grammar, LanguageDef, SupportLang,
    LANGUAGES,
};
pub use parser::{ErrorNode, ParsedSource, SourceParser};
pub use validator::{check_parsed, code_frame, line_col, validate_syntax};
