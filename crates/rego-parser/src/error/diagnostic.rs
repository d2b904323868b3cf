//! The core diagnostic type for the Rego error system.
//!
//! A [`Diagnostic`] describes a single terminal error: a code, a message,
//! labeled source spans, optional help text and the resolved location of the
//! primary span.

use std::fmt;

use rego_core::{Location, Span};

use crate::error::{error_code::ErrorCode, label::Label};

/// A rich diagnostic message with source location information.
///
/// # Example
///
/// ```text
/// error[E203]: default rule value cannot contain ref
///   --> policy.rego:3:16
///    |
///  3 | default allow = input.admin
///    |                 ^^^^^^^^^^^ not a constant
///    |
///    = help: default values must be constants
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    code: ErrorCode,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    location: Option<Location>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use rego_parser::error::{Diagnostic, ErrorCode};
    /// # use rego_core::Span;
    ///
    /// let diag = Diagnostic::error(ErrorCode::E200, "package name cannot contain variables")
    ///     .with_label(Span::new(8..14), "variable in path")
    ///     .with_help("use string segments only");
    /// ```
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            location: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Location of the primary span, once resolved against its source.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Span of the first primary label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.iter().find(|l| l.is_primary()).map(Label::span)
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Set the resolved location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.code, self.message)
    }
}

impl std::error::Error for Diagnostic {}
