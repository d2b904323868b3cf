//! Lexical analyzer for Rego source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! Whitespace, newlines and comments are kept as tokens: the grammar decides
//! where they are significant, and comments are later turned into
//! statements of their own.
//!
//! The public entry point is [`tokenize`]. Lexing stops at the first error.

use log::trace;
use winnow::{
    Parser as _,
    ascii::{digit0, digit1},
    combinator::{alt, cut_err, opt, preceded, repeat},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_while},
};

use rego_core::Span;

use crate::{
    error::{Diagnostic, ErrorCode},
    source::SourceFile,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()` to provide detailed error
/// messages with codes, help text, and precise span information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LexerDiagnostic {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    pub start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Build an unrecoverable error at the current position.
fn cut<'a>(input: &Input<'a>, diagnostic: LexerDiagnostic) -> ErrMode<ContextError<LexerDiagnostic>> {
    ErrMode::Cut(ContextError::new().add_context(input, &input.checkpoint(), diagnostic))
}

/// Exactly four hex digits.
fn hex4<'a>(input: &mut Input<'a>) -> IResult<'a, u32> {
    take_while(4, |c: char| c.is_ascii_hexdigit())
        .try_map(|hex: &str| u32::from_str_radix(hex, 16))
        .parse_next(input)
}

/// Parse a unicode escape sequence in a string: `\uXXXX`.
///
/// This parser handles the portion after the backslash, starting with 'u'.
/// A high surrogate must be directly followed by an escaped low surrogate;
/// the pair is combined into one character. Lone surrogates are rejected.
fn string_escape_unicode<'a>(input: &mut Input<'a>, escape_start: usize) -> IResult<'a, char> {
    let invalid = LexerDiagnostic {
        code: ErrorCode::E004,
        message: "invalid unicode escape",
        help: Some("use format `\\uXXXX` with exactly four hex digits"),
        start: escape_start,
    };
    let unpaired = LexerDiagnostic {
        message: "unpaired surrogate in unicode escape",
        help: Some("a `\\uD800`-`\\uDBFF` escape must be followed by a `\\uDC00`-`\\uDFFF` escape"),
        ..invalid
    };

    let high = preceded('u', cut_err(hex4.context(invalid))).parse_next(input)?;
    let code = match high {
        0xD800..=0xDBFF => {
            let low = cut_err(
                preceded("\\u", hex4)
                    .verify(|low: &u32| (0xDC00..=0xDFFF).contains(low))
                    .context(unpaired),
            )
            .parse_next(input)?;
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        }
        0xDC00..=0xDFFF => return Err(cut(input, unpaired)),
        code => code,
    };
    char::from_u32(code).ok_or_else(|| cut(input, invalid))
}

/// Parse a standard escape character in a string after the backslash.
fn string_escape_char<'a>(input: &mut Input<'a>) -> IResult<'a, char> {
    one_of(['"', '\\', '/', 'b', 'f', 'n', 'r', 't'])
        .map(|c| match c {
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            other => other,
        })
        .parse_next(input)
}

/// Parse an escape sequence in a string starting with backslash.
///
/// The escape set is the one of JSON: `\"`, `\\`, `\/`, `\b`, `\f`, `\n`,
/// `\r`, `\t` and `\uXXXX`.
fn string_escape<'a>(input: &mut Input<'a>) -> IResult<'a, char> {
    let escape_start = input.current_token_start();

    let backslash: IResult<'a, char> = '\\'.parse_next(input);
    backslash?;

    match string_escape_unicode(input, escape_start) {
        Ok(ch) => return Ok(ch),
        Err(ErrMode::Backtrack(_)) => {} // Try next alternative
        Err(e) => return Err(e),         // Propagate cut errors (E004)
    }

    if let Ok(ch) = string_escape_char(input) {
        return Ok(ch);
    }

    Err(cut(
        input,
        LexerDiagnostic {
            code: ErrorCode::E003,
            message: "invalid escape sequence",
            help: Some(
                "valid escapes: `\\\"`, `\\\\`, `\\/`, `\\b`, `\\f`, `\\n`, `\\r`, `\\t`, `\\uXXXX`",
            ),
            start: escape_start,
        },
    ))
}

/// Parse a complete string literal with double quotes.
///
/// Raw control characters are not allowed between the quotes; a line break
/// before the closing quote leaves the string unterminated.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    // Regular string content (not quotes, backslashes, or control characters)
    let string_char = none_of(|c: char| c == '"' || c == '\\' || (c as u32) < 0x20);

    let start_pos = input.current_token_start();

    let opening: IResult<'a, char> = '"'.parse_next(input);
    opening?;

    let content = repeat(0.., alt((string_escape, string_char)))
        .fold(String::new, |mut acc, ch| {
            acc.push(ch);
            acc
        })
        .parse_next(input)?;

    let closing: IResult<'a, char> = '"'.parse_next(input);
    if closing.is_ok() {
        return Ok(Token::String(content));
    }

    let diagnostic = match input.peek_token() {
        Some(c) if c != '\n' && c != '\r' => LexerDiagnostic {
            code: ErrorCode::E002,
            message: "control character in string literal",
            help: Some("escape control characters, e.g. `\\t` or `\\u0000`"),
            start: input.current_token_start(),
        },
        _ => LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"`"),
            start: start_pos,
        },
    };
    Err(cut(input, diagnostic))
}

/// Parse an unsigned JSON number: `0` or a digit sequence without leading
/// zero, then an optional fraction and an optional exponent.
///
/// The sign is a separate token; the grammar attaches it.
fn number_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();

    let number: IResult<'a, &'a str> = (
        alt(('0'.void(), (one_of('1'..='9'), digit0).void())),
        opt(('.', digit1)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .parse_next(input);
    let text = number?;

    // `01`, `1abc` and `1e` are not split into several tokens
    if input
        .peek_token()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(cut(
            input,
            LexerDiagnostic {
                code: ErrorCode::E005,
                message: "invalid number literal",
                help: Some("numbers use JSON syntax, e.g. `0`, `-12`, `1.5e3`"),
                start: start_pos,
            },
        ));
    }

    Ok(Token::Number(text))
}

/// Parse line comment starting with '#'
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    preceded('#', take_while(0.., |c| c != '\n' && c != '\r'))
        .map(Token::Comment)
        .parse_next(input)
}

/// Parse identifiers
fn identifier<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    // Start with letter or underscore, followed by alphanumeric or underscore
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .map(Token::Identifier)
        .parse_next(input)
}

/// Parse multi-character operators
fn multi_char_operator<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        literal("!=").value(Token::NotEquals),
        literal("<=").value(Token::LessEqual),
        literal(">=").value(Token::GreaterEqual),
    ))
    .parse_next(input)
}

/// Parse single character operators
fn operator<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        '='.value(Token::Equals),
        '<'.value(Token::Less),
        '>'.value(Token::Greater),
        '+'.value(Token::Plus),
        '-'.value(Token::Minus),
        '*'.value(Token::Star),
        '/'.value(Token::Slash),
        '&'.value(Token::Ampersand),
        '|'.value(Token::Pipe),
    ))
    .parse_next(input)
}

/// Parse punctuation
fn punctuation<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        ','.value(Token::Comma),
        ':'.value(Token::Colon),
        ';'.value(Token::Semicolon),
        '.'.value(Token::Dot),
    ))
    .parse_next(input)
}

/// Parse whitespace (spaces and tabs, not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    take_while(1.., [' ', '\t'])
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse newline: `\r\n`, `\n` or a lone `\r`
fn newline<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt(("\r\n", "\n", "\r"))
        .value(Token::Newline)
        .parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<'a, PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,
        string_literal,
        number_literal,
        identifier,
        multi_char_operator, // Must come before single char operators
        operator,
        punctuation,
        newline, // Must come before whitespace
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    let span = Span::new(start_pos..end_pos);

    Ok(PositionedToken::new(token, span))
}

/// Span from `start` to `end`, widened to one character when empty.
fn non_empty_span(text: &str, start: usize, end: usize) -> Span {
    if end > start {
        return Span::new(start..end);
    }
    let width = text[start..].chars().next().map_or(0, char::len_utf8);
    Span::new(start..start + width)
}

/// Convert an ErrMode and error position to a Diagnostic.
///
/// Extracts `LexerDiagnostic` from the error context for rich error info
/// with code, message, and help. Falls back to E002 (unexpected character)
/// if no diagnostic context is found.
fn convert_err_mode(
    err: ErrMode<ContextError<LexerDiagnostic>>,
    token_start: usize,
    error_pos: usize,
    source: &SourceFile,
) -> Diagnostic {
    let context_error = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    if let Some(LexerDiagnostic {
        code,
        message,
        help,
        start,
    }) = context_error.context().next()
    {
        let span = non_empty_span(source.text(), *start, error_pos);

        let mut diag = Diagnostic::error(*code, *message)
            .with_label(span, code.description())
            .with_location(source.location(span));
        if let Some(h) = help {
            diag = diag.with_help(*h);
        }
        return diag;
    }

    // Fallback when no context is present
    let span = non_empty_span(source.text(), token_start, token_start);
    Diagnostic::error(
        ErrorCode::E002,
        format!("unexpected character `{}`", &source.text()[span.range()]),
    )
    .with_label(span, ErrorCode::E002.description())
    .with_location(source.location(span))
}

/// Split source text into positioned tokens.
///
/// # Errors
///
/// Returns the diagnostic of the first lexical error.
pub fn tokenize(source: &SourceFile) -> Result<Vec<PositionedToken<'_>>, Diagnostic> {
    let mut input = LocatingSlice::new(source.text());
    let mut tokens = Vec::new();

    while input.eof_offset() > 0 {
        let token_start = input.current_token_start();
        match positioned_token(&mut input) {
            Ok(token) => tokens.push(token),
            Err(e) => {
                let error_pos = input.current_token_start();
                return Err(convert_err_mode(e, token_start, error_pos, source));
            }
        }
    }

    trace!(file = source.name(), tokens = tokens.len(); "Tokenized source");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_single_token(input: &str, expected: Token<'_>) {
        let mut located_input = LocatingSlice::new(input);
        let result = positioned_token(&mut located_input);
        assert!(result.is_ok(), "Failed to parse: {}", input);
        let positioned = result.unwrap();
        assert_eq!(positioned.token, expected);
        assert_eq!(positioned.span, Span::new(0..input.len()));
    }

    fn lex(input: &str) -> Result<Vec<Token<'_>>, Diagnostic> {
        // Leaked so the returned tokens can borrow from the source.
        let source: &'static SourceFile = Box::leak(Box::new(SourceFile::new("test.rego", input)));
        tokenize(source).map(|tokens| tokens.into_iter().map(|t| t.token).collect())
    }

    fn lex_err(input: &str) -> Diagnostic {
        lex(input).expect_err("input should not tokenize")
    }

    #[test]
    fn test_identifiers() {
        test_single_token("allow", Token::Identifier("allow"));
        test_single_token("_private", Token::Identifier("_private"));
        test_single_token("var123", Token::Identifier("var123"));
        test_single_token("package", Token::Identifier("package"));
    }

    #[test]
    fn test_operators() {
        test_single_token("=", Token::Equals);
        test_single_token("!=", Token::NotEquals);
        test_single_token("<=", Token::LessEqual);
        test_single_token(">=", Token::GreaterEqual);
        test_single_token("<", Token::Less);
        test_single_token(">", Token::Greater);
        test_single_token("+", Token::Plus);
        test_single_token("-", Token::Minus);
        test_single_token("*", Token::Star);
        test_single_token("/", Token::Slash);
        test_single_token("&", Token::Ampersand);
        test_single_token("|", Token::Pipe);
    }

    #[test]
    fn test_punctuation() {
        test_single_token("{", Token::LeftBrace);
        test_single_token("}", Token::RightBrace);
        test_single_token("[", Token::LeftBracket);
        test_single_token("]", Token::RightBracket);
        test_single_token("(", Token::LeftParen);
        test_single_token(")", Token::RightParen);
        test_single_token(",", Token::Comma);
        test_single_token(":", Token::Colon);
        test_single_token(";", Token::Semicolon);
        test_single_token(".", Token::Dot);
    }

    #[test]
    fn test_numbers() {
        test_single_token("0", Token::Number("0"));
        test_single_token("42", Token::Number("42"));
        test_single_token("3.14", Token::Number("3.14"));
        test_single_token("1e10", Token::Number("1e10"));
        test_single_token("2.5E-3", Token::Number("2.5E-3"));
        test_single_token("10000000000000000000.5", Token::Number("10000000000000000000.5"));
    }

    #[test]
    fn test_number_followed_by_dot_access() {
        assert_eq!(
            lex("1.a").unwrap(),
            vec![Token::Number("1"), Token::Dot, Token::Identifier("a")]
        );
    }

    #[test]
    fn test_minus_is_separate_token() {
        assert_eq!(lex("-1").unwrap(), vec![Token::Minus, Token::Number("1")]);
    }

    #[test]
    fn test_invalid_numbers() {
        for input in ["01", "1abc", "1e", "2.5e+x"] {
            let err = lex_err(input);
            assert_eq!(err.code(), ErrorCode::E005, "input: {input}");
            assert_eq!(err.primary_span().map(|s| s.start()), Some(0));
        }
    }

    #[test]
    fn test_string_literals() {
        test_single_token("\"hello world\"", Token::String("hello world".to_string()));
        test_single_token("\"\"", Token::String(String::new()));
        test_single_token("\"#not a comment\"", Token::String("#not a comment".to_string()));
    }

    #[test]
    fn test_string_escape_sequences() {
        test_single_token(
            r#""a\"b\\c\/d\be\ff\ng\rh\ti""#,
            Token::String("a\"b\\c/d\u{08}e\u{0C}f\ng\rh\ti".to_string()),
        );
    }

    #[test]
    fn test_unicode_escapes() {
        test_single_token(r#""\u0041""#, Token::String("A".to_string()));
        test_single_token(r#""\u00e9""#, Token::String("\u{e9}".to_string()));
        test_single_token(r#""\ud83d\ude00""#, Token::String("\u{1F600}".to_string()));
    }

    #[test]
    fn test_invalid_escape() {
        let err = lex_err(r#"x = "a\qb""#);
        assert_eq!(err.code(), ErrorCode::E003);
        assert_eq!(err.primary_span().map(|s| s.start()), Some(6));
    }

    #[test]
    fn test_invalid_unicode_escapes() {
        for input in [r#""\u12""#, r#""\uZZZZ""#, r#""\ud83d""#, r#""\ude00""#, r#""\ud83dA""#] {
            let err = lex_err(input);
            assert_eq!(err.code(), ErrorCode::E004, "input: {input}");
            assert_eq!(err.primary_span().map(|s| s.start()), Some(1));
        }
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex_err("x = \"abc\ny");
        assert_eq!(err.code(), ErrorCode::E001);
        assert_eq!(err.primary_span(), Some(Span::new(4..8)));
        assert_eq!(err.location().map(|l| (l.row(), l.col())), Some((1, 5)));
    }

    #[test]
    fn test_control_character_in_string() {
        let err = lex_err("\"a\tb\"");
        assert_eq!(err.code(), ErrorCode::E002);
        assert_eq!(err.primary_span(), Some(Span::new(2..3)));
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex_err("x = 1\ny = @");
        assert_eq!(err.code(), ErrorCode::E002);
        assert_eq!(err.message(), "unexpected character `@`");
        assert_eq!(err.location().map(|l| (l.row(), l.col())), Some((2, 5)));

        assert_eq!(lex_err("x ! y").code(), ErrorCode::E002);
        assert_eq!(lex_err("x = \u{00e9}").message(), "unexpected character `\u{00e9}`");
    }

    #[test]
    fn test_comments_and_newlines() {
        assert_eq!(
            lex("x # note\r\ny\rz").unwrap(),
            vec![
                Token::Identifier("x"),
                Token::Whitespace,
                Token::Comment(" note"),
                Token::Newline,
                Token::Identifier("y"),
                Token::Newline,
                Token::Identifier("z"),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let source = SourceFile::new("a.rego", "p[x] != \"v\"");
        let tokens = tokenize(&source).unwrap();
        let spans: Vec<_> = tokens.iter().map(|t| t.span.range()).collect();
        assert_eq!(spans, vec![0..1, 1..2, 2..3, 3..4, 4..5, 5..7, 7..8, 8..11]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(lex("").unwrap(), vec![]);
    }
}
