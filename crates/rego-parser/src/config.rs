//! Language tables injected into the parser.

use std::fmt;

use rego_core::{BuiltinRegistry, ImportPathValidator, Keywords, RootDocumentImports};

/// Default limit on how deeply terms and bodies may nest.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Immutable configuration consulted while parsing.
///
/// A configuration is built once and may be shared by reference between any
/// number of concurrent parse calls.
///
/// # Example
///
/// ```
/// # use rego_parser::ParseConfig;
/// # use rego_core::{BuiltinRegistry, Keywords};
///
/// let config = ParseConfig::default()
///     .with_keywords(Keywords::default().with_keyword("some"))
///     .with_builtins(BuiltinRegistry::default().with_infix("+", "add"));
/// assert!(config.keywords().is_keyword("some"));
/// ```
pub struct ParseConfig {
    keywords: Keywords,
    builtins: BuiltinRegistry,
    import_validator: Box<dyn ImportPathValidator + Send + Sync>,
    max_depth: usize,
}

impl ParseConfig {
    /// Replace the keyword table.
    pub fn with_keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    /// Replace the infix builtin registry.
    pub fn with_builtins(mut self, builtins: BuiltinRegistry) -> Self {
        self.builtins = builtins;
        self
    }

    /// Replace the legality predicate for import paths and `with` targets.
    pub fn with_import_validator<V>(mut self, validator: V) -> Self
    where
        V: ImportPathValidator + Send + Sync + 'static,
    {
        self.import_validator = Box::new(validator);
        self
    }

    /// Replace the nesting limit. Deeper input fails with `E102`.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    pub fn import_validator(&self) -> &(dyn ImportPathValidator + Send + Sync) {
        self.import_validator.as_ref()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            keywords: Keywords::default(),
            builtins: BuiltinRegistry::default(),
            import_validator: Box::new(RootDocumentImports::default()),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConfig")
            .field("keywords", &self.keywords)
            .field("builtins", &self.builtins)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
