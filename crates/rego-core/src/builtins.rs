//! Infix operator resolution.
//!
//! The registry maps an infix spelling (`+`, `!=`, ...) to the canonical
//! name of the builtin function it stands for. It is built once and only
//! read afterwards.

use std::collections::HashMap;

/// Default infix spellings and the builtins they resolve to.
pub const DEFAULT_INFIX_OPERATORS: &[(&str, &str)] = &[
    ("=", "eq"),
    ("!=", "neq"),
    ("<", "lt"),
    (">", "gt"),
    ("<=", "lte"),
    (">=", "gte"),
    ("+", "plus"),
    ("-", "minus"),
    ("*", "mul"),
    ("/", "div"),
    ("&", "and"),
    ("|", "or"),
];

/// Read-only mapping from infix symbol to canonical function name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinRegistry {
    infix: HashMap<String, String>,
}

impl BuiltinRegistry {
    /// A registry without any operators. Every symbol resolves to itself.
    pub fn empty() -> Self {
        Self {
            infix: HashMap::new(),
        }
    }

    /// Register (or replace) the builtin for an infix symbol.
    pub fn with_infix(mut self, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        self.infix.insert(symbol.into(), name.into());
        self
    }

    /// The builtin registered for `symbol`, if any.
    pub fn lookup(&self, symbol: &str) -> Option<&str> {
        self.infix.get(symbol).map(String::as_str)
    }

    /// Name to use for the operator term of `symbol`.
    ///
    /// Unregistered symbols are used verbatim.
    pub fn operator_name<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.lookup(symbol).unwrap_or(symbol)
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        DEFAULT_INFIX_OPERATORS
            .iter()
            .fold(Self::empty(), |registry, (symbol, name)| {
                registry.with_infix(*symbol, *name)
            })
    }
}
