use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeSitterError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("syntax error at {line}:{column} (byte {byte_start}..{byte_end})")]
    SyntaxError {
        byte_start: usize,
        byte_end: usize,
        line: usize,
        column: usize,
    },
}
