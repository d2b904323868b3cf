//! Error and diagnostic system for the Rego parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Labeled spans for rich error context
//! - Locations resolved to file, row and column
//!
//! Every parse call stops at its first error. The failing
//! [`Diagnostic`] is wrapped in a [`ParseError`] and returned to the caller;
//! no partial result is produced.
//!
//! # Example
//!
//! ```
//! # use rego_parser::error::{Diagnostic, ErrorCode};
//! # use rego_core::Span;
//!
//! let diag = Diagnostic::error(ErrorCode::E203, "default rule value cannot contain ref")
//!     .with_label(Span::new(16..27), "not a constant")
//!     .with_help("default values must be constants");
//! ```

mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
