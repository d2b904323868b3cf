use std::fmt;

use rego_core::Span;

/// Token types for the Rego language.
///
/// Keywords are not distinguished here: they lex as identifiers and the
/// grammar consults the configured keyword table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Literals
    Identifier(&'src str),
    /// Unsigned number literal, exactly as written.
    Number(&'src str),
    /// Decoded string literal.
    String(String),

    // Operators
    Equals,       // =
    NotEquals,    // !=
    LessEqual,    // <=
    GreaterEqual, // >=
    Less,         // <
    Greater,      // >
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Ampersand,    // &
    Pipe,         // |

    // Punctuation
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    LeftParen,    // (
    RightParen,   // )
    Comma,        // ,
    Colon,        // :
    Semicolon,    // ;
    Dot,          // .

    // Comments
    Comment(&'src str), // # comment

    // Whitespace
    Whitespace,
    Newline,
}

impl Token<'_> {
    /// True for tokens the grammar treats as insignificant whitespace.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::Newline | Token::Comment(_))
    }

    /// Source spelling of operator and punctuation tokens.
    pub fn symbol(&self) -> Option<&'static str> {
        let symbol = match self {
            Token::Equals => "=",
            Token::NotEquals => "!=",
            Token::LessEqual => "<=",
            Token::GreaterEqual => ">=",
            Token::Less => "<",
            Token::Greater => ">",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Ampersand => "&",
            Token::Pipe => "|",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Dot => ".",
            _ => return None,
        };
        Some(symbol)
    }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl<'src> fmt::Display for PositionedToken<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Number(n) => write!(f, "{n}"),
            Token::String(s) => write!(f, "{s:?}"),
            Token::Comment(comment) => write!(f, "#{comment}"),
            Token::Whitespace => write!(f, " "),
            Token::Newline => write!(f, "\\n"),
            other => write!(f, "{}", other.symbol().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivia() {
        assert!(Token::Whitespace.is_trivia());
        assert!(Token::Newline.is_trivia());
        assert!(Token::Comment(" note").is_trivia());
        assert!(!Token::Semicolon.is_trivia());
    }

    #[test]
    fn test_display() {
        assert_eq!(Token::NotEquals.to_string(), "!=");
        assert_eq!(Token::Identifier("allow").to_string(), "allow");
        assert_eq!(Token::Comment(" x").to_string(), "# x");
        assert_eq!(Token::String("a\"b".to_string()).to_string(), r#""a\"b""#);
    }
}
