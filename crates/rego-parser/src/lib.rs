//! # Rego Parser
//!
//! Parser for the Rego policy language. This crate turns source text into
//! the syntax tree defined in [`rego_core`].
//!
//! Parsing runs in two phases: the lexer splits the text into positioned
//! tokens (comments, whitespace and newlines included) and the grammar
//! builds statements from them. Every call stops at its first error and
//! returns it as a [`ParseError`] carrying one located [`Diagnostic`].
//!
//! ## Usage
//!
//! ```
//! # use rego_parser::{parse_module, ParseConfig, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         package authz
//!
//!         default allow = false
//!
//!         allow { input.user = "admin" }
//!     "#;
//!
//!     let config = ParseConfig::default();
//!     let module = parse_module("authz.rego", source, &config)?;
//!     assert_eq!(module.package.to_string(), "package authz");
//!     assert_eq!(module.rules.len(), 2);
//!     Ok(())
//! }
//! ```
//!
//! [`Diagnostic`]: error::Diagnostic

mod config;
pub mod error;
mod legality;
mod lexer;
mod module;
mod parser;
#[cfg(test)]
mod parser_tests;
mod source;
mod tokens;

pub use config::{DEFAULT_MAX_DEPTH, ParseConfig};
pub use error::ParseError;
pub use source::SourceFile;

use log::{debug, trace};

use rego_core::{Body, Comment, Module, Statement};

use error::Diagnostic;
use tokens::Token;

/// Parse source text into its sequence of statements.
///
/// Statements come back in source order. Comments are returned as
/// statements of their own, wherever they appear. Empty input yields an
/// empty sequence.
///
/// # Arguments
///
/// * `file` - Name reported in locations
/// * `source` - The Rego source text
/// * `config` - Keywords, infix builtins and the import path check to use
///
/// # Example
///
/// ```
/// # use rego_parser::{parse_statements, ParseConfig};
/// # use rego_core::Statement;
///
/// let statements =
///     parse_statements("q.rego", "x = 1; y = 2 # note", &ParseConfig::default()).unwrap();
/// assert!(matches!(statements[0], Statement::Body(_)));
/// assert!(matches!(statements[1], Statement::Comment(_)));
/// ```
pub fn parse_statements(
    file: &str,
    source: &str,
    config: &ParseConfig,
) -> Result<Vec<Statement>, ParseError> {
    let source = SourceFile::new(file, source);
    Ok(statements(&source, config)?)
}

/// Parse source text into a module.
///
/// The first statement (comments aside) must be the package declaration.
/// A top-level `name = value` becomes the constant rule
/// `name = value { true }`; any other top-level expression is an error.
pub fn parse_module(file: &str, source: &str, config: &ParseConfig) -> Result<Module, ParseError> {
    let source = SourceFile::new(file, source);
    let statements = statements(&source, config)?;
    let module = module::assemble_module(statements, &source, config).inspect_err(log_failure)?;
    debug!(
        file = source.name(),
        imports = module.imports.len(),
        rules = module.rules.len();
        "Assembled module"
    );
    Ok(module)
}

/// Parse source text into a query.
///
/// Every statement must be an expression body; the bodies are joined in
/// order into one.
pub fn parse_query(file: &str, source: &str, config: &ParseConfig) -> Result<Body, ParseError> {
    let source = SourceFile::new(file, source);
    let statements = statements(&source, config)?;
    let query = module::assemble_query(statements, &source).inspect_err(log_failure)?;
    debug!(file = source.name(), literals = query.len(); "Assembled query");
    Ok(query)
}

fn log_failure(diagnostic: &Diagnostic) {
    debug!(code = diagnostic.code().as_str(); "Parse failed: {}", diagnostic.message());
}

/// Tokenize, parse and merge comments back into the statement sequence.
fn statements(source: &SourceFile, config: &ParseConfig) -> Result<Vec<Statement>, Diagnostic> {
    debug!(file = source.name(), bytes = source.text().len(); "Parsing");

    let tokens = lexer::tokenize(source).inspect_err(log_failure)?;
    trace!(tokens = tokens.len(); "Tokenized source");

    let comments: Vec<Comment> = tokens
        .iter()
        .filter_map(|token| match token.token {
            Token::Comment(text) => Some(Comment {
                text: text.to_string(),
                location: Some(source.location(token.span)),
            }),
            _ => None,
        })
        .collect();

    let parsed = parser::parse_program(&tokens, source, config).inspect_err(log_failure)?;

    let mut statements = parsed;
    statements.extend(comments.into_iter().map(Statement::Comment));
    // Stable, so statements sharing an offset keep their parse order.
    statements.sort_by_key(|statement| statement.offset().unwrap_or(usize::MAX));

    debug!(file = source.name(), statements = statements.len(); "Parsed statements");
    Ok(statements)
}
