//! Language registry backed by the grammars bundled in ast-grep-language.
//!
//! Names follow the highlight.js naming scheme so that annotations written
//! for highlight.js keep working (`typescript`, `xml`, `bash`, ...).

pub use ast_grep_language::SupportLang;

/// A highlightable language and the grammar used to parse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageDef {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub grammar: SupportLang,
}

impl LanguageDef {
    /// Case-insensitive match against the name or any alias.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

pub const LANGUAGES: &[LanguageDef] = &[
    LanguageDef {
        name: "bash",
        aliases: &["sh", "zsh", "shell"],
        grammar: SupportLang::Bash,
    },
    LanguageDef {
        name: "c",
        aliases: &["h"],
        grammar: SupportLang::C,
    },
    LanguageDef {
        name: "cpp",
        aliases: &["cc", "c++", "h++", "hpp", "hh", "hxx", "cxx"],
        grammar: SupportLang::Cpp,
    },
    LanguageDef {
        name: "csharp",
        aliases: &["cs", "c#"],
        grammar: SupportLang::CSharp,
    },
    LanguageDef {
        name: "css",
        aliases: &[],
        grammar: SupportLang::Css,
    },
    LanguageDef {
        name: "elixir",
        aliases: &["ex", "exs"],
        grammar: SupportLang::Elixir,
    },
    LanguageDef {
        name: "go",
        aliases: &["golang"],
        grammar: SupportLang::Go,
    },
    LanguageDef {
        name: "haskell",
        aliases: &["hs"],
        grammar: SupportLang::Haskell,
    },
    LanguageDef {
        name: "java",
        aliases: &["jsp"],
        grammar: SupportLang::Java,
    },
    LanguageDef {
        name: "javascript",
        aliases: &["js", "jsx", "mjs", "cjs"],
        grammar: SupportLang::JavaScript,
    },
    LanguageDef {
        name: "json",
        aliases: &["jsonc"],
        grammar: SupportLang::Json,
    },
    LanguageDef {
        name: "kotlin",
        aliases: &["kt", "kts"],
        grammar: SupportLang::Kotlin,
    },
    LanguageDef {
        name: "lua",
        aliases: &[],
        grammar: SupportLang::Lua,
    },
    LanguageDef {
        name: "php",
        aliases: &[],
        grammar: SupportLang::Php,
    },
    LanguageDef {
        name: "python",
        aliases: &["py", "gyp", "ipython"],
        grammar: SupportLang::Python,
    },
    LanguageDef {
        name: "ruby",
        aliases: &["rb", "gemspec", "podspec", "thor", "irb"],
        grammar: SupportLang::Ruby,
    },
    LanguageDef {
        name: "rust",
        aliases: &["rs"],
        grammar: SupportLang::Rust,
    },
    LanguageDef {
        name: "scala",
        aliases: &[],
        grammar: SupportLang::Scala,
    },
    LanguageDef {
        name: "swift",
        aliases: &[],
        grammar: SupportLang::Swift,
    },
    LanguageDef {
        name: "typescript",
        aliases: &["ts", "mts", "cts"],
        grammar: SupportLang::TypeScript,
    },
    LanguageDef {
        name: "xml",
        aliases: &["html", "xhtml", "rss", "atom", "xjb", "xsd", "xsl", "plist", "svg"],
        grammar: SupportLang::Html,
    },
    LanguageDef {
        name: "yaml",
        aliases: &["yml"],
        grammar: SupportLang::Yaml,
    },
];

/// Look up a language by name or alias.
pub fn find_language(name: &str) -> Option<&'static LanguageDef> {
    LANGUAGES.iter().find(|def| def.matches(name))
}

/// Registered language names, without aliases.
pub fn language_names() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|def| def.name)
}

/// Grammar used when a formatter is asked to parse with `parser`.
///
/// Accepts every registered language plus the component dialects that are
/// parsed as markup.
pub fn parser_grammar(parser: &str) -> Option<SupportLang> {
    match parser.to_ascii_lowercase().as_str() {
        "svelte" | "vue" | "html" => Some(SupportLang::Html),
        "tsx" => Some(SupportLang::Tsx),
        other => find_language(other).map(|def| def.grammar),
    }
}

pub fn is_markup_grammar(grammar: SupportLang) -> bool {
    matches!(grammar, SupportLang::Html)
}
