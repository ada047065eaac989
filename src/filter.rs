//! Entry filter deciding whether a file is preprocessed at all.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Paths under dependency and build-cache directories.
pub const DEFAULT_IGNORE_PATTERN: &str = r"(node_modules|\.svelte-kit)";

/// Predicate selecting files to leave untouched.
///
/// A caller-supplied value replaces the default entirely.
#[derive(Clone)]
pub enum IgnorePath {
    Pattern(Regex),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl IgnorePath {
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(path),
            Self::Predicate(predicate) => predicate(path),
        }
    }
}

impl Default for IgnorePath {
    fn default() -> Self {
        let regex = Regex::new(DEFAULT_IGNORE_PATTERN).expect("default ignore pattern is valid");
        Self::Pattern(regex)
    }
}

impl fmt::Debug for IgnorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Whether a file should be preprocessed.
///
/// Files without a path, ignored paths and empty content pass through.
pub fn should_process(path: Option<&str>, content: &str, ignore: &IgnorePath) -> bool {
    let Some(path) = path.filter(|path| !path.is_empty()) else {
        log::trace!("skipping input without a filename");
        return false;
    };
    if ignore.is_ignored(path) {
        log::trace!("skipping ignored path {path}");
        return false;
    }
    if content.is_empty() {
        log::trace!("skipping empty file {path}");
        return false;
    }
    true
}
