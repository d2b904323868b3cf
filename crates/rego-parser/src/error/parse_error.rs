//! The ParseError type returned by every parse entry point.
//!
//! Parsing stops at the first error, so a [`ParseError`] always wraps
//! exactly one [`Diagnostic`].

use std::fmt;

use crate::error::Diagnostic;

/// Error type for a failed parse call.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    diagnostic: Box<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from its diagnostic.
    pub fn new(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostic: Box::new(diagnostic),
        }
    }

    /// Get the diagnostic describing the failure.
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    /// Consume the error, returning its diagnostic.
    pub fn into_diagnostic(self) -> Diagnostic {
        *self.diagnostic
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = self.diagnostic.location() {
            write!(f, "{location}: ")?;
        }
        write!(f, "{}", self.diagnostic)
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(diagnostic)
    }
}
