//! Guest language identifiers
//!
//! The set of visualizable languages is closed: one dynamic language backed by
//! the embedded VM ([`Language::Javascript`]) and four languages simulated by
//! pattern rules. Adding a language means adding a grammar
//! ([`crate::parse::grammar`]), a rule set ([`crate::sim::rules`]), and
//! optionally linter rules ([`crate::lint`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A guest language selectable by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
    Go,
    Rust,
    Cpp,
}

/// All guest languages, in UI order.
pub const LANGUAGES: [Language; 5] = [
    Language::Javascript,
    Language::Python,
    Language::Go,
    Language::Rust,
    Language::Cpp,
];

impl Language {
    /// Whether this language executes on the embedded dynamic VM
    /// (exact steps) rather than the heuristic simulator (approximate steps).
    pub fn is_dynamic(self) -> bool {
        matches!(self, Language::Javascript)
    }

    /// Lowercase identifier used in cache fingerprints and persisted history.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Cpp => "cpp",
        }
    }

    /// Capitalized name for status messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Javascript => "JavaScript",
            Language::Python => "Python",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::Cpp => "C++",
        }
    }

    /// Guess the language from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "mjs" => Some(Language::Javascript),
            "py" => Some(Language::Python),
            "go" => Some(Language::Go),
            "rs" => Some(Language::Rust),
            "cpp" | "cc" | "cxx" | "c" => Some(Language::Cpp),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping() {
        assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
        assert_eq!(Language::from_extension("mjs"), Some(Language::Javascript));
        assert_eq!(Language::from_extension("txt"), None);
    }

    #[test]
    fn only_javascript_is_dynamic() {
        for lang in LANGUAGES {
            assert_eq!(lang.is_dynamic(), lang == Language::Javascript);
        }
    }
}
