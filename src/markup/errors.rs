use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("<{name}> was left open (opened at byte {byte_start})")]
    UnclosedElement { name: String, byte_start: usize },

    #[error("</{name}> attempted to close an element that was not open (byte {byte_start})")]
    UnexpectedClosingTag { name: String, byte_start: usize },

    #[error("unterminated {construct} starting at byte {byte_start}")]
    Unterminated {
        construct: &'static str,
        byte_start: usize,
    },

    #[error("expected {expected} at byte {byte_start}")]
    Expected {
        expected: &'static str,
        byte_start: usize,
    },
}

impl MarkupError {
    /// Byte offset the error points at.
    pub fn byte_start(&self) -> usize {
        match self {
            MarkupError::UnclosedElement { byte_start, .. }
            | MarkupError::UnexpectedClosingTag { byte_start, .. }
            | MarkupError::Unterminated { byte_start, .. }
            | MarkupError::Expected { byte_start, .. } => *byte_start,
        }
    }

    /// 1-based line and column of the error within `source`.
    pub fn location(&self, source: &str) -> (usize, usize) {
        crate::ts::line_col(source, self.byte_start())
    }
}
