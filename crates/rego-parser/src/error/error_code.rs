//! Error codes for the Rego diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Legality errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed on the same line.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that does not start any token, or a raw
    /// control character appeared inside a string literal.
    E002,

    /// Invalid escape sequence.
    ///
    /// Valid escapes are: `\"`, `\\`, `\/`, `\b`, `\f`, `\n`, `\r`, `\t`, `\uXXXX`.
    E003,

    /// Invalid unicode escape.
    ///
    /// A `\u` escape without exactly four hex digits, or a UTF-16 surrogate
    /// that is not part of a valid pair.
    E004,

    /// Invalid number literal.
    ///
    /// A number with a leading zero or directly followed by a letter.
    E005,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token that no grammar alternative accepts.
    E100,

    /// Unexpected end of input.
    ///
    /// The input ended before a complete construct was parsed.
    E101,

    /// Nesting too deep.
    ///
    /// Terms and comprehension bodies are nested deeper than the configured
    /// limit allows.
    E102,

    // =========================================================================
    // Legality Errors (E2xx)
    // =========================================================================
    /// Package path contains a variable.
    E200,

    /// Package path contains a segment that is not a string.
    E201,

    /// Rule head key has an illegal type.
    ///
    /// When a rule declares both a key and a value, the key must be a
    /// variable, string or reference.
    E202,

    /// Default rule value is not constant.
    ///
    /// Default values cannot contain variables or references outside of
    /// comprehensions.
    E203,

    /// Invalid import path or `with` target.
    E204,

    /// Empty rule body.
    E205,

    /// Misplaced or missing package declaration.
    E206,

    /// Module statement is not a rule.
    E207,

    /// Query statement is not a body.
    E208,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            // Legality errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "invalid unicode escape",
            ErrorCode::E005 => "invalid number literal",
            // Parser errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unexpected end of input",
            ErrorCode::E102 => "nesting too deep",
            // Legality errors
            ErrorCode::E200 => "non-ground package path",
            ErrorCode::E201 => "non-string package path segment",
            ErrorCode::E202 => "illegal rule head key",
            ErrorCode::E203 => "non-constant default value",
            ErrorCode::E204 => "invalid path",
            ErrorCode::E205 => "empty rule body",
            ErrorCode::E206 => "misplaced package",
            ErrorCode::E207 => "not a rule",
            ErrorCode::E208 => "not a query",
        }
    }

    /// True for errors raised on well-formed input that breaks a language rule.
    pub fn is_legality(&self) -> bool {
        self.as_str().starts_with("E2")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
