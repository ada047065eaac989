use crate::filter::IgnorePath;
use crate::preprocess::HighlightOptions;
use crate::transform::FormatOverrides;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Contents of a `highlight.toml` file.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HighlightConfig {
    /// Regex of paths to skip; replaces the default when set.
    #[serde(default)]
    pub ignore_path: Option<String>,
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(default)]
    pub formatter: FormatOverrides,
}

impl HighlightConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if let Some(pattern) = &self.ignore_path {
            if let Err(err) = regex::Regex::new(pattern) {
                issues.push(ValidationIssue::InvalidPattern {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                });
            }
        }
        if self.formatter.tab_width == Some(0) {
            issues.push(ValidationIssue::ZeroWidth {
                field: "formatter.tab_width",
            });
        }
        if self
            .base_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            issues.push(ValidationIssue::EmptyField { field: "base_dir" });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Preprocessor options described by this file.
    pub fn to_options(&self) -> Result<HighlightOptions, ValidationError> {
        self.validate()?;
        let ignore_path = match &self.ignore_path {
            Some(pattern) => Some(IgnorePath::pattern(pattern).map_err(|err| ValidationError {
                issues: vec![ValidationIssue::InvalidPattern {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                }],
            })?),
            None => None,
        };
        Ok(HighlightOptions {
            ignore_path,
            formatter_options: self.formatter.clone(),
            base_dir: self.base_dir.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    InvalidPattern { pattern: String, message: String },
    ZeroWidth { field: &'static str },
    EmptyField { field: &'static str },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::InvalidPattern { pattern, message } => {
                write!(f, "ignore_path '{pattern}' is not a valid regex: {message}")
            }
            ValidationIssue::ZeroWidth { field } => write!(f, "'{field}' must be at least 1"),
            ValidationIssue::EmptyField { field } => write!(f, "'{field}' must not be empty"),
        }
    }
}
