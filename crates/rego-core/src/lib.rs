//! Abstract syntax tree for a declarative policy language.
//!
//! This crate holds the data model produced by `rego-parser`: value-shaped
//! [`Term`]s, the statement nodes built from them, and the immutable
//! language tables the parser consults while building them (keywords,
//! infix builtins and import path legality).

pub mod builtins;
pub mod import_path;
pub mod keywords;
pub mod location;
pub mod statement;
pub mod term;

pub use builtins::BuiltinRegistry;
pub use import_path::{ImportPathError, ImportPathValidator, RootDocumentImports};
pub use keywords::Keywords;
pub use location::{Location, Span};
pub use statement::{
    Body, Comment, Expr, ExprTerms, Head, Import, Module, Package, Rule, Statement, With,
};
pub use term::{ArrayComprehension, Number, Ref, Set, Term, Value, Var};

/// Name of the implicit root document every package lives under.
pub const DEFAULT_ROOT_DOCUMENT: &str = "data";
