//! Error type for the CLI.

use std::io;

use thiserror::Error;

use rego_parser::ParseError;

use crate::config::ConfigError;

/// Everything that can make a `rego` run fail.
///
/// The `Parse` variant keeps the source text so the diagnostic can be
/// rendered with a snippet.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{err}")]
    Parse {
        err: ParseError,
        name: String,
        src: String,
    },

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(
        err: ParseError,
        name: impl Into<String>,
        src: impl Into<String>,
    ) -> Self {
        Self::Parse {
            err,
            name: name.into(),
            src: src.into(),
        }
    }
}
