//! Per-block diagnostics.
//!
//! Diagnostics never change the output beyond skipping the offending block.
//! Each is logged at `warn` level as it is produced and returned to the
//! caller with the processed result.

use crate::transform::FormatError;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Annotated block with no extractable code.
    NoCode,
    InvalidLanguage {
        language: String,
        suggestion: Option<String>,
    },
    /// Formatting failed; the raw code was highlighted instead.
    FormatFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Path of the file, relative to the base directory when possible.
    pub file: String,
    pub kind: DiagnosticKind,
    pub message: String,
    /// Extra lines such as a code frame.
    pub detail: Option<String>,
}

impl Diagnostic {
    pub fn no_code(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind: DiagnosticKind::NoCode,
            message: "No code provided".to_string(),
            detail: None,
        }
    }

    pub fn invalid_language(
        file: impl Into<String>,
        language: &str,
        suggestion: Option<&str>,
    ) -> Self {
        Self {
            file: file.into(),
            kind: DiagnosticKind::InvalidLanguage {
                language: language.to_string(),
                suggestion: suggestion.map(str::to_string),
            },
            message: format!("Invalid language \"{language}\""),
            detail: None,
        }
    }

    pub fn format_failed(file: impl Into<String>, error: &FormatError) -> Self {
        let detail = match &error.code_frame {
            Some(frame) => format!("{}\n{frame}", error.message),
            None => error.message.clone(),
        };
        Self {
            file: file.into(),
            kind: DiagnosticKind::FormatFailed,
            message: "Formatting error".to_string(),
            detail: Some(detail),
        }
    }

    /// Log the diagnostic through the `log` facade.
    pub fn emit(&self) {
        match &self.kind {
            DiagnosticKind::InvalidLanguage {
                suggestion: Some(suggestion),
                ..
            } => log::warn!("{self} (did you mean \"{suggestion}\"?)"),
            _ => log::warn!("{self}"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.file, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n{detail}")?;
        }
        Ok(())
    }
}

/// `file` relative to `base_dir` (default: the working directory), or as
/// given when it lies elsewhere.
pub fn display_path(file: &str, base_dir: Option<&Path>) -> String {
    let base: PathBuf = match base_dir {
        Some(base) => base.to_path_buf(),
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(_) => return file.to_string(),
        },
    };

    match Path::new(file).strip_prefix(&base) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.display().to_string(),
        _ => file.to_string(),
    }
}
