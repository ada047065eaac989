use crate::config::schema::{HighlightConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Conventional config file name looked up by the binary.
pub const CONFIG_FILE_NAME: &str = "highlight.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse config TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse config TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid config ({}): {}", path.display(), source),
                None => write!(f, "invalid config: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<HighlightConfig, ConfigError> {
    let config: HighlightConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

/// Load a config file. A relative `base_dir` is resolved against the
/// directory containing the file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<HighlightConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = load_from_str(&contents).map_err(|error| error.with_path(path))?;

    if let (Some(base_dir), Some(parent)) = (&config.base_dir, path.parent()) {
        if base_dir.is_relative() {
            config.base_dir = Some(parent.join(base_dir));
        }
    }
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let config = load_from_str(
            r#"
ignore_path = "(node_modules|demo)"
base_dir = "site"

[formatter]
tab_width = 4
use_tabs = true
normalize_spacing = false
"#,
        )
        .unwrap();

        assert_eq!(config.ignore_path.as_deref(), Some("(node_modules|demo)"));
        assert_eq!(config.base_dir, Some(PathBuf::from("site")));
        assert_eq!(config.formatter.tab_width, Some(4));
        assert_eq!(config.formatter.use_tabs, Some(true));
        assert_eq!(config.formatter.normalize_spacing, Some(false));
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(load_from_str("").unwrap(), HighlightConfig::default());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = load_from_str("ignore = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
    }

    #[test]
    fn validation_errors_are_reported() {
        let err = load_from_str("ignore_path = \"[\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(err.to_string().starts_with("invalid config: ignore_path '['"));
    }
}
