//! Reserved words of the policy language.

use std::collections::BTreeSet;

/// Words that are never recognized as variables.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "not", "package", "import", "as", "default", "with", "null", "true", "false",
];

/// Keyword lookup table consulted when recognizing variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    words: BTreeSet<String>,
}

impl Keywords {
    /// An empty table. Mostly useful for tests; the grammar's own keywords
    /// still have to be matched literally.
    pub fn empty() -> Self {
        Self {
            words: BTreeSet::new(),
        }
    }

    /// Add a reserved word.
    pub fn with_keyword(mut self, word: impl Into<String>) -> Self {
        self.words.insert(word.into());
        self
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl Default for Keywords {
    fn default() -> Self {
        DEFAULT_KEYWORDS
            .iter()
            .fold(Self::empty(), |keywords, word| keywords.with_keyword(*word))
    }
}
