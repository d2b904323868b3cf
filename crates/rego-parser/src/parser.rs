//! Parser for Rego source tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer)
//! into [`Statement`]s. It is a backtracking recursive-descent parser with
//! ordered alternatives: the first alternative that matches wins.
//! Whitespace, newlines and comments are tokens, so the grammar states
//! where they may appear and where they are required.
//!
//! Syntax errors are reported at the farthest token any alternative was
//! rejected at, together with everything that was expected there. Legality
//! errors (illegal package names, non-constant defaults, etc.) abort the
//! parse immediately with their own diagnostic.
//!
//! The entry point is [`parse_program`].

use std::{
    cell::{Cell, RefCell},
    fmt,
};

use winnow::{
    Parser as _,
    combinator::{alt, delimited, opt, preceded, repeat},
    error::{AddContext, ContextError, ErrMode},
    stream::{Stateful, Stream, TokenSlice},
};

use rego_core::{
    ArrayComprehension, Body, Expr, ExprTerms, Head, Import, Location, Number, Package, Ref, Rule,
    Set, Span, Statement, Term, Value, Var, With,
};

use crate::{
    config::ParseConfig,
    error::{Diagnostic, ErrorCode},
    legality,
    source::SourceFile,
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone)]
pub(crate) enum Context {
    /// Remaining token count (`eof_offset()`) at a token no statement or
    /// literal can start with
    StartOffset(usize),
    /// A construct matched but is not legal
    Illegal(Box<Diagnostic>),
}

/// What a parser was looking for when it rejected a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expected {
    /// Exact source spelling: a keyword or a symbol
    Literal(&'static str),
    /// A class of tokens
    Description(&'static str),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Literal(text) => write!(f, "`{text}`"),
            Expected::Description(text) => f.write_str(text),
        }
    }
}

const TERM: Expected = Expected::Description("term");
const VARIABLE: Expected = Expected::Description("variable");
const STRING: Expected = Expected::Description("string");
const OPERATOR: Expected = Expected::Description("operator");
const OBJECT_KEY: Expected = Expected::Description("object key");
const WHITESPACE: Expected = Expected::Description("whitespace");
const NEWLINE: Expected = Expected::Description("newline");
const END_OF_INPUT: Expected = Expected::Description("end of input");

const ARITHMETIC_OPERATORS: &[&str] = &["+", "-", "*", "/", "&", "|"];
const COMPARISON_OPERATORS: &[&str] = &["!=", "<=", ">=", "<", ">"];

/// State shared by every parser of one run.
#[derive(Debug)]
pub(crate) struct ParseState<'a> {
    config: &'a ParseConfig,
    source: &'a SourceFile,
    tokens: &'a [PositionedToken<'a>],
    /// Index of the farthest token any parser rejected
    farthest: Cell<Option<usize>>,
    /// Everything expected at `farthest`
    expected: RefCell<Vec<Expected>>,
    /// Terms and literals currently open
    depth: Cell<usize>,
}

impl<'a> ParseState<'a> {
    fn new(
        config: &'a ParseConfig,
        source: &'a SourceFile,
        tokens: &'a [PositionedToken<'a>],
    ) -> Self {
        Self {
            config,
            source,
            tokens,
            farthest: Cell::new(None),
            expected: RefCell::new(Vec::new()),
            depth: Cell::new(0),
        }
    }

    /// Record that the token `remaining` tokens before the end was rejected.
    ///
    /// Rejections on whitespace are attributed to the next significant token.
    fn reject(&self, remaining: usize, expected: Expected) {
        let mut index = self.tokens.len() - remaining;
        while self.tokens.get(index).is_some_and(|t| t.is_trivia()) {
            index += 1;
        }

        match self.farthest.get() {
            Some(farthest) if farthest > index => {}
            Some(farthest) if farthest == index => {
                let mut list = self.expected.borrow_mut();
                if !list.contains(&expected) {
                    list.push(expected);
                }
            }
            _ => {
                self.farthest.set(Some(index));
                self.expected.replace(vec![expected]);
            }
        }
    }

    /// Forget rejections at or before token `index`.
    fn passed(&self, index: usize) {
        if self.farthest.get().is_some_and(|farthest| farthest <= index) {
            self.farthest.set(None);
            self.expected.borrow_mut().clear();
        }
    }

    fn location(&self, span: Span) -> Location {
        self.source.location(span)
    }

    /// Diagnostic for a syntax error at token `index`.
    fn syntax_error(&self, index: usize) -> Diagnostic {
        let expected = self.expected.borrow();
        let help = match expected.as_slice() {
            [] => None,
            [only] => Some(format!("expected {only}")),
            many => Some(format!(
                "expected one of {}",
                many.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        };

        let (diagnostic, span) = match self.tokens.get(index) {
            Some(token) => {
                let text = &self.source.text()[token.span.range()];
                let diagnostic =
                    Diagnostic::error(ErrorCode::E100, format!("unexpected token `{text}`"))
                        .with_label(token.span, "unexpected token");
                (diagnostic, token.span)
            }
            None => {
                let span = self.source.end_span();
                let diagnostic = Diagnostic::error(ErrorCode::E101, "unexpected end of input")
                    .with_label(span, "input ends here");
                (diagnostic, span)
            }
        };

        let diagnostic = diagnostic.with_location(self.location(span));
        match help {
            Some(help) => diagnostic.with_help(help),
            None => diagnostic,
        }
    }
}

type Input<'a> = Stateful<TokenSlice<'a, PositionedToken<'a>>, &'a ParseState<'a>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

fn backtrack() -> ErrMode<ContextError<Context>> {
    ErrMode::Backtrack(ContextError::new())
}

/// Record a rejection at the current position and backtrack.
fn reject<O>(input: &Input<'_>, expected: Expected) -> IResult<O> {
    input.state.reject(input.eof_offset(), expected);
    Err(backtrack())
}

/// Abort the parse with a legality diagnostic.
fn illegal<O>(input: &Input<'_>, diagnostic: Diagnostic) -> IResult<O> {
    let e = ContextError::new().add_context(
        input,
        &input.checkpoint(),
        Context::Illegal(Box::new(diagnostic)),
    );
    Err(ErrMode::Cut(e))
}

/// Run `parser` one nesting level deeper.
///
/// Past the configured limit the parse is aborted at the next token with
/// `E102`, before the stack can run out.
fn nested<'a, O>(
    input: &mut Input<'a>,
    parser: impl FnOnce(&mut Input<'a>) -> IResult<O>,
) -> IResult<O> {
    let state = input.state;
    let max_depth = state.config.max_depth();
    let depth = state.depth.get() + 1;
    if depth > max_depth {
        let span = input
            .peek_token()
            .map_or_else(|| state.source.end_span(), |t| t.span);
        return illegal(
            input,
            Diagnostic::error(
                ErrorCode::E102,
                format!("nesting deeper than {max_depth} levels"),
            )
            .with_label(span, "too deeply nested")
            .with_location(state.location(span)),
        );
    }

    state.depth.set(depth);
    let result = parser(input);
    state.depth.set(depth - 1);
    result
}

/// Consume the next token.
///
/// Rejections recorded at or before it are dropped: some alternative got
/// past them, so they no longer mark where the parse got stuck.
fn advance(input: &mut Input<'_>) {
    let index = mark(input);
    if input.next_token().is_some() {
        input.state.passed(index);
    }
}

/// Index of the next token.
fn mark(input: &Input<'_>) -> usize {
    input.state.tokens.len() - input.eof_offset()
}

/// Span of the tokens consumed since `start`.
fn span_since(input: &Input<'_>, start: usize) -> Span {
    let tokens = input.state.tokens;
    let end = mark(input);
    let first = tokens.get(start).map(|t| t.span);
    let last = end.checked_sub(1).and_then(|i| tokens.get(i)).map(|t| t.span);
    match (first, last) {
        (Some(first), Some(last)) if end > start => first.union(last),
        (Some(first), _) => Span::new(first.start()..first.start()),
        _ => input.state.source.end_span(),
    }
}

fn location_since(input: &Input<'_>, start: usize) -> Location {
    input.state.location(span_since(input, start))
}

/// Consume the next token when `accept` maps it to a value; otherwise record
/// `expected` and backtrack.
fn expect<'a, O>(
    expected: Expected,
    mut accept: impl FnMut(&'a PositionedToken<'a>) -> Option<O>,
) -> impl FnMut(&mut Input<'a>) -> IResult<O> {
    move |input: &mut Input<'a>| match input.peek_token().and_then(&mut accept) {
        Some(output) => {
            advance(input);
            Ok(output)
        }
        None => reject(input, expected),
    }
}

/// Consume the next token if it is `symbol`, without recording a rejection.
///
/// Used where a token has to follow without whitespace and its absence
/// simply ends the construct.
fn eat(input: &mut Input<'_>, symbol: &'static str) -> Option<Span> {
    let span = input
        .peek_token()
        .and_then(|t| (t.symbol() == Some(symbol)).then_some(t.span))?;
    advance(input);
    Some(span)
}

/// Operator or punctuation token spelled `symbol`.
fn punct<'a>(symbol: &'static str) -> impl FnMut(&mut Input<'a>) -> IResult<Span> {
    expect(Expected::Literal(symbol), move |t| {
        (t.symbol() == Some(symbol)).then_some(t.span)
    })
}

/// Identifier spelled exactly `word`.
fn keyword<'a>(word: &'static str) -> impl FnMut(&mut Input<'a>) -> IResult<Span> {
    expect(Expected::Literal(word), move |t| {
        matches!(t.token, Token::Identifier(name) if name == word).then_some(t.span)
    })
}

/// One whitespace, newline or comment token.
fn trivia(input: &mut Input<'_>) -> IResult<()> {
    match input.peek_token() {
        Some(token) if token.is_trivia() => {
            advance(input);
            Ok(())
        }
        _ => Err(backtrack()),
    }
}

/// Optional whitespace, newlines and comments.
fn ws0(input: &mut Input<'_>) -> IResult<()> {
    repeat(0.., trivia).parse_next(input)
}

/// Required whitespace, newlines or comments.
fn ws1(input: &mut Input<'_>) -> IResult<()> {
    if input.peek_token().is_some_and(|t| t.is_trivia()) {
        ws0(input)
    } else {
        reject(input, WHITESPACE)
    }
}

/// Spaces and tabs only.
fn horizontal_ws0(input: &mut Input<'_>) -> IResult<()> {
    while input
        .peek_token()
        .is_some_and(|t| matches!(t.token, Token::Whitespace))
    {
        advance(input);
    }
    Ok(())
}

/// Any token; always fails without backtracking.
///
/// Tried last where a statement or literal must start, so that a token
/// nothing can start with stops the parse right there.
fn unexpected<O>(input: &mut Input<'_>) -> IResult<O> {
    let remaining = input.eof_offset();
    if input.next_token().is_none() {
        return Err(backtrack());
    }
    let e = ContextError::new().add_context(
        input,
        &input.checkpoint(),
        Context::StartOffset(remaining),
    );
    Err(ErrMode::Cut(e))
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

fn term(input: &mut Input<'_>) -> IResult<Term> {
    nested(input, term_at_depth)
}

fn term_at_depth(input: &mut Input<'_>) -> IResult<Term> {
    let Some(first) = input.peek_token() else {
        return reject(input, TERM);
    };
    match &first.token {
        Token::LeftBracket => array_or_comprehension(input),
        Token::LeftBrace => object_or_set(input),
        Token::Number(_) | Token::Minus => number(input),
        Token::String(_) => string(input),
        Token::Identifier("true" | "false" | "null") => literal_constant(input),
        Token::Identifier("set") => alt((empty_set, ref_or_var)).parse_next(input),
        Token::Identifier(name) if input.state.config.keywords().is_keyword(name) => {
            reject(input, TERM)
        }
        Token::Identifier(_) => ref_or_var(input),
        _ => reject(input, TERM),
    }
}

/// JSON number, optionally preceded by an adjacent `-`.
fn number(input: &mut Input<'_>) -> IResult<Term> {
    let state = input.state;
    let checkpoint = input.checkpoint();

    let minus = eat(input, "-");
    let digits = input.peek_token().and_then(|t| match t.token {
        Token::Number(_) => Some(t.span),
        _ => None,
    });
    let span = match (minus, digits) {
        (None, Some(digits)) => digits,
        (Some(minus), Some(digits)) if minus.end() == digits.start() => minus.union(digits),
        _ => {
            input.reset(&checkpoint);
            return reject(input, TERM);
        }
    };
    advance(input);

    let text = &state.source.text()[span.range()];
    let location = state.location(span);
    match serde_json::from_str::<Number>(text) {
        Ok(number) => Ok(Term::number(number).with_location(location)),
        Err(err) => illegal(
            input,
            Diagnostic::error(ErrorCode::E005, format!("invalid number literal `{text}`"))
                .with_label(span, err.to_string())
                .with_location(location),
        ),
    }
}

fn string(input: &mut Input<'_>) -> IResult<Term> {
    let state = input.state;
    expect(STRING, move |t| match &t.token {
        Token::String(value) => {
            Some(Term::string(value.as_str()).with_location(state.location(t.span)))
        }
        _ => None,
    })
    .parse_next(input)
}

/// `true`, `false` or `null`.
fn literal_constant(input: &mut Input<'_>) -> IResult<Term> {
    let state = input.state;
    expect(TERM, move |t| {
        let value = match t.token {
            Token::Identifier("true") => Value::Boolean(true),
            Token::Identifier("false") => Value::Boolean(false),
            Token::Identifier("null") => Value::Null,
            _ => return None,
        };
        Some(Term::new(value).with_location(state.location(t.span)))
    })
    .parse_next(input)
}

/// An identifier that is not a keyword.
fn var_name(input: &mut Input<'_>) -> IResult<(Var, Span)> {
    let keywords = input.state.config.keywords();
    expect(VARIABLE, move |t| match t.token {
        Token::Identifier(name) if !keywords.is_keyword(name) => Some((Var::new(name), t.span)),
        _ => None,
    })
    .parse_next(input)
}

fn var(input: &mut Input<'_>) -> IResult<Term> {
    let (name, span) = var_name(input)?;
    Ok(Term::new(Value::Var(name)).with_location(input.state.location(span)))
}

/// A variable followed by any number of `.name` and `[term]` accessors.
///
/// Without accessors the variable itself is returned.
fn ref_or_var(input: &mut Input<'_>) -> IResult<Term> {
    let start = mark(input);
    let head = var(input)?;
    let path: Vec<Term> = repeat(0.., ref_accessor).parse_next(input)?;
    if path.is_empty() {
        return Ok(head);
    }
    Ok(Term::reference(Ref::new(head, path)).with_location(location_since(input, start)))
}

/// `.name` or `[term]` directly after the previous part of a reference.
///
/// `.name` produces the string `"name"`, so `a.b` and `a["b"]` are equal.
fn ref_accessor(input: &mut Input<'_>) -> IResult<Term> {
    if eat(input, ".").is_some() {
        let (name, span) = var_name(input)?;
        return Ok(Term::string(name.as_str()).with_location(input.state.location(span)));
    }
    if eat(input, "[").is_some() {
        ws0(input)?;
        let key = term(input)?;
        ws0(input)?;
        punct("]").parse_next(input)?;
        return Ok(key);
    }
    Err(backtrack())
}

/// The remaining items of a comma separated list whose first item is
/// already parsed. A trailing comma is allowed.
fn rest_of_list<'a, O>(
    input: &mut Input<'a>,
    first: O,
    item: fn(&mut Input<'a>) -> IResult<O>,
) -> IResult<Vec<O>> {
    let mut items = vec![first];
    let rest: Vec<O> =
        repeat(0.., preceded((ws0, punct(","), ws0), item)).parse_next(input)?;
    items.extend(rest);
    opt((ws0, punct(","))).parse_next(input)?;
    Ok(items)
}

/// `[ ]`, `[ t, ... ]` or `[ t | body ]`.
fn array_or_comprehension(input: &mut Input<'_>) -> IResult<Term> {
    let start = mark(input);
    punct("[").parse_next(input)?;
    ws0(input)?;

    if opt(punct("]")).parse_next(input)?.is_some() {
        return Ok(Term::array(Vec::new()).with_location(location_since(input, start)));
    }

    let first = term(input)?;

    if opt((ws0, punct("|"))).parse_next(input)?.is_some() {
        ws0(input)?;
        let body = whitespace_body(input)?;
        ws0(input)?;
        punct("]").parse_next(input)?;
        let comprehension = ArrayComprehension {
            term: Box::new(first),
            body,
        };
        return Ok(Term::new(Value::ArrayComprehension(comprehension))
            .with_location(location_since(input, start)));
    }

    let elements = rest_of_list(input, first, term)?;
    ws0(input)?;
    punct("]").parse_next(input)?;
    Ok(Term::array(elements).with_location(location_since(input, start)))
}

/// Scalars, references and variables may be object keys.
fn is_object_key(term: &Term) -> bool {
    term.value.is_scalar() || matches!(term.value, Value::Ref(_) | Value::Var(_))
}

/// `key: value` inside an object after the first pair.
fn object_pair(input: &mut Input<'_>) -> IResult<(Term, Term)> {
    let checkpoint = input.checkpoint();
    let key = term(input)?;
    if !is_object_key(&key) {
        input.reset(&checkpoint);
        return reject(input, OBJECT_KEY);
    }
    ws0(input)?;
    punct(":").parse_next(input)?;
    ws0(input)?;
    let value = term(input)?;
    Ok((key, value))
}

/// `{ }` (an empty object), `{ k: v, ... }` or `{ t, ... }`.
///
/// The first element decides: a key followed by `:` starts an object,
/// anything else a set.
fn object_or_set(input: &mut Input<'_>) -> IResult<Term> {
    let start = mark(input);
    punct("{").parse_next(input)?;
    ws0(input)?;

    if opt(punct("}")).parse_next(input)?.is_some() {
        return Ok(Term::object(Vec::new()).with_location(location_since(input, start)));
    }

    let first = term(input)?;

    if is_object_key(&first) && opt((ws0, punct(":"))).parse_next(input)?.is_some() {
        ws0(input)?;
        let value = term(input)?;
        let pairs = rest_of_list(input, (first, value), object_pair)?;
        ws0(input)?;
        punct("}").parse_next(input)?;
        return Ok(Term::object(pairs).with_location(location_since(input, start)));
    }

    let elements = rest_of_list(input, first, term)?;
    ws0(input)?;
    punct("}").parse_next(input)?;
    let set: Set = elements.into_iter().collect();
    Ok(Term::set(set).with_location(location_since(input, start)))
}

/// `set()`, with `(` directly after `set`.
fn empty_set(input: &mut Input<'_>) -> IResult<Term> {
    let start = mark(input);
    keyword("set").parse_next(input)?;
    if eat(input, "(").is_none() {
        return Err(backtrack());
    }
    ws0(input)?;
    punct(")").parse_next(input)?;
    Ok(Term::set(Set::new()).with_location(location_since(input, start)))
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// One of `symbols`, as an operator term named through the builtin registry.
fn operator<'a>(
    expected: Expected,
    symbols: &'static [&'static str],
) -> impl FnMut(&mut Input<'a>) -> IResult<Term> {
    move |input: &mut Input<'a>| {
        let state = input.state;
        expect(expected, |t: &'a PositionedToken<'a>| {
            let symbol = t.symbol().filter(|s| symbols.contains(s))?;
            let location = state.location(t.span);
            let name = state.config.builtins().operator_name(symbol);
            let head = Term::var(name).with_location(location.clone());
            Some(Term::reference(Ref::new(head, Vec::new())).with_location(location))
        })
        .parse_next(input)
    }
}

/// `_ op _ term` for an arithmetic operator.
fn arithmetic_tail(input: &mut Input<'_>) -> IResult<(Term, Term)> {
    ws0(input)?;
    let op = operator(OPERATOR, ARITHMETIC_OPERATORS).parse_next(input)?;
    ws0(input)?;
    let right = term(input)?;
    Ok((op, right))
}

/// `_ op _ term` for a comparison operator other than `=`.
fn comparison_tail(input: &mut Input<'_>) -> IResult<(Term, Term)> {
    ws0(input)?;
    let op = operator(OPERATOR, COMPARISON_OPERATORS).parse_next(input)?;
    ws0(input)?;
    let right = term(input)?;
    Ok((op, right))
}

/// `name(args)` where the name is a variable with optional `.name` parts and
/// `(` follows the name directly.
fn call(input: &mut Input<'_>) -> IResult<Vec<Term>> {
    let state = input.state;
    let start = mark(input);

    let head = var(input)?;
    let mut path = Vec::new();
    while eat(input, ".").is_some() {
        let (name, span) = var_name(input)?;
        path.push(Term::string(name.as_str()).with_location(state.location(span)));
    }
    let name = Term::reference(Ref::new(head, path)).with_location(location_since(input, start));

    if eat(input, "(").is_none() {
        return Err(backtrack());
    }
    ws0(input)?;

    let mut terms = vec![name];
    if let Some(first) = opt(term).parse_next(input)? {
        terms.push(first);
        let rest: Vec<Term> =
            repeat(0.., preceded((ws0, punct(","), ws0), term)).parse_next(input)?;
        terms.extend(rest);
    }
    ws0(input)?;
    punct(")").parse_next(input)?;
    Ok(terms)
}

/// The terms of an expression.
///
/// In order of preference:
/// - `out = a op b`, giving `[op, a, b, out]`
/// - `a op b = out`, giving `[op, a, b, out]`
/// - `a cmp b`, giving `[cmp, a, b]` (this includes `a = b`)
/// - `name(args)`, giving `[name, args...]`
/// - a single term
fn expr_terms(input: &mut Input<'_>) -> IResult<ExprTerms> {
    let start = input.checkpoint();
    let first = term(input)?;
    let after_first = input.checkpoint();

    if input
        .peek_token()
        .is_some_and(|t| matches!(t.token, Token::LeftParen))
    {
        input.reset(&start);
        return match call(input) {
            Ok(terms) => Ok(ExprTerms::Call(terms)),
            Err(ErrMode::Backtrack(_)) => {
                input.reset(&after_first);
                Ok(ExprTerms::Term(first))
            }
            Err(e) => Err(e),
        };
    }

    if let Some(equals) = opt(preceded(ws0, operator(Expected::Literal("="), &["="])))
        .parse_next(input)?
    {
        ws0(input)?;
        let Some(left) = opt(term).parse_next(input)? else {
            input.reset(&after_first);
            return Ok(ExprTerms::Term(first));
        };
        if let Some((op, right)) = opt(arithmetic_tail).parse_next(input)? {
            return Ok(ExprTerms::Call(vec![op, left, right, first]));
        }
        return Ok(ExprTerms::Call(vec![equals, first, left]));
    }

    let reverse = opt((
        arithmetic_tail,
        preceded((ws0, punct("="), ws0), term),
    ))
    .parse_next(input)?;
    if let Some(((op, right), output)) = reverse {
        return Ok(ExprTerms::Call(vec![op, first, right, output]));
    }

    if let Some((op, right)) = opt(comparison_tail).parse_next(input)? {
        return Ok(ExprTerms::Call(vec![op, first, right]));
    }

    Ok(ExprTerms::Term(first))
}

/// `with target as value`
fn with_modifier(input: &mut Input<'_>) -> IResult<With> {
    let start = mark(input);
    keyword("with").parse_next(input)?;
    ws1(input)?;
    let target = term(input)?;
    ws1(input)?;
    keyword("as").parse_next(input)?;
    ws1(input)?;
    let value = term(input)?;

    if let Err(diagnostic) =
        legality::check_import_path(&target, input.state.config.import_validator())
    {
        return illegal(input, diagnostic);
    }

    Ok(With {
        target,
        value,
        location: Some(location_since(input, start)),
    })
}

/// `not`? expression `with` modifiers.
fn literal(input: &mut Input<'_>) -> IResult<Expr> {
    nested(input, literal_at_depth)
}

fn literal_at_depth(input: &mut Input<'_>) -> IResult<Expr> {
    let start = mark(input);
    let negated = opt((keyword("not"), ws1)).parse_next(input)?.is_some();
    let terms = expr_terms(input)?;
    let with: Vec<With> = repeat(0.., preceded(ws1, with_modifier)).parse_next(input)?;
    Ok(Expr {
        terms,
        negated,
        with,
        location: Some(location_since(input, start)),
    })
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// `;` or a line break, optionally after a trailing comment.
fn literal_separator(input: &mut Input<'_>) -> IResult<()> {
    horizontal_ws0(input)?;
    if opt(punct(";")).parse_next(input)?.is_some() {
        return Ok(());
    }
    if input
        .peek_token()
        .is_some_and(|t| matches!(t.token, Token::Comment(_)))
    {
        advance(input);
    }
    expect(NEWLINE, |t| matches!(t.token, Token::Newline).then_some(())).parse_next(input)
}

/// Literals separated by `;` or line breaks, as inside braces.
fn whitespace_body(input: &mut Input<'_>) -> IResult<Body> {
    let first = literal(input)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded((literal_separator, ws0), literal)).parse_next(input)?;
    let mut exprs = vec![first];
    exprs.extend(rest);
    Ok(Body::new(exprs))
}

/// Literals separated by `;` only, as at the top level.
fn non_whitespace_body(input: &mut Input<'_>) -> IResult<Body> {
    let first = literal(input)?;
    let rest: Vec<Expr> = repeat(
        0..,
        preceded((ws0, punct(";"), ws0), alt((literal, unexpected))),
    )
    .parse_next(input)?;
    let mut exprs = vec![first];
    exprs.extend(rest);
    Ok(Body::new(exprs))
}

/// `{ body }` after a rule head.
fn braced_body(input: &mut Input<'_>) -> IResult<Body> {
    let start = mark(input);
    punct("{").parse_next(input)?;
    ws0(input)?;
    let body = opt(whitespace_body).parse_next(input)?;
    ws0(input)?;
    punct("}").parse_next(input)?;

    match body {
        Some(body) => Ok(body),
        None => {
            let span = span_since(input, start);
            illegal(input, legality::empty_body(span, input.state.location(span)))
        }
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// `default name = constant`
fn default_rule(input: &mut Input<'_>) -> IResult<Vec<Rule>> {
    let start = mark(input);
    keyword("default").parse_next(input)?;
    ws1(input)?;
    let (name, _) = var_name(input)?;
    ws0(input)?;
    punct("=").parse_next(input)?;
    ws0(input)?;
    let value = term(input)?;

    if let Err(diagnostic) = legality::check_default_value(&value) {
        return illegal(input, diagnostic);
    }

    let location = location_since(input, start);
    let head = Head {
        name,
        key: None,
        value: Some(value),
        location: Some(location.clone()),
    };
    Ok(vec![Rule {
        default: true,
        head,
        body: Body::truthy(Some(location)),
    }])
}

/// `name [key]? (= value)? { body } { body } ...`
///
/// Every body yields one rule sharing the same head.
fn normal_rule(input: &mut Input<'_>) -> IResult<Vec<Rule>> {
    let start = mark(input);
    let (name, _) = var_name(input)?;
    let key = opt(delimited((ws0, punct("["), ws0), term, (ws0, punct("]")))).parse_next(input)?;
    let value = opt(preceded((ws0, punct("="), ws0), term)).parse_next(input)?;
    let location = location_since(input, start);

    let value = match (&key, value) {
        (None, None) => Some(Term::boolean(true).with_location(location.clone())),
        (_, value) => value,
    };
    let head = Head {
        name,
        key,
        value,
        location: Some(location),
    };

    ws0(input)?;
    let first = braced_body(input)?;
    let rest: Vec<Body> = repeat(0.., preceded(ws0, braced_body)).parse_next(input)?;

    if let Err(diagnostic) = legality::check_head_key(&head) {
        return illegal(input, diagnostic);
    }

    Ok(std::iter::once(first)
        .chain(rest)
        .map(|body| Rule {
            default: false,
            head: head.clone(),
            body,
        })
        .collect())
}

/// `package name`
fn package(input: &mut Input<'_>) -> IResult<Statement> {
    let start = mark(input);
    keyword("package").parse_next(input)?;
    ws1(input)?;
    let name = ref_or_var(input)?;
    let location = location_since(input, start);

    match legality::package_path(name) {
        Ok(path) => Ok(Statement::Package(Package {
            path,
            location: Some(location),
        })),
        Err(diagnostic) => illegal(input, diagnostic),
    }
}

/// `import path (as alias)?`
fn import(input: &mut Input<'_>) -> IResult<Statement> {
    let start = mark(input);
    keyword("import").parse_next(input)?;
    ws1(input)?;
    let path = ref_or_var(input)?;
    let alias = opt(preceded((ws1, keyword("as"), ws1), var_name))
        .parse_next(input)?
        .map(|(alias, _)| alias);

    if let Err(diagnostic) =
        legality::check_import_path(&path, input.state.config.import_validator())
    {
        return illegal(input, diagnostic);
    }

    Ok(Statement::Import(Import {
        path,
        alias,
        location: Some(location_since(input, start)),
    }))
}

fn statement(input: &mut Input<'_>) -> IResult<Statement> {
    alt((
        package,
        import,
        alt((default_rule, normal_rule)).map(Statement::Rules),
        non_whitespace_body.map(Statement::Body),
        unexpected,
    ))
    .parse_next(input)
}

/// Statements separated by whitespace, up to the end of input.
fn program(input: &mut Input<'_>) -> IResult<Vec<Statement>> {
    ws0(input)?;
    let mut statements = Vec::new();
    if let Some(first) = opt(statement).parse_next(input)? {
        statements.push(first);
        let rest: Vec<Statement> = repeat(0.., preceded(ws1, statement)).parse_next(input)?;
        statements.extend(rest);
    }
    ws0(input)?;

    if input.eof_offset() > 0 {
        return reject(input, END_OF_INPUT);
    }
    Ok(statements)
}

/// Convert a winnow error into a diagnostic.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    state: &ParseState<'_>,
    remaining: usize,
) -> Diagnostic {
    let mut start_offset = None;
    if let ErrMode::Backtrack(e) | ErrMode::Cut(e) = &error {
        for context in e.context() {
            match context {
                Context::Illegal(diagnostic) => return (**diagnostic).clone(),
                Context::StartOffset(offset) => start_offset = Some(*offset),
            }
        }
    }

    let index = state
        .farthest
        .get()
        .or_else(|| start_offset.map(|offset| state.tokens.len() - offset))
        .unwrap_or(state.tokens.len() - remaining);
    state.syntax_error(index)
}

/// Parse a token stream into statements, in source order.
///
/// Comment tokens are skipped here; see [`crate::parse_statements`].
pub(crate) fn parse_program<'a>(
    tokens: &'a [PositionedToken<'a>],
    source: &'a SourceFile,
    config: &'a ParseConfig,
) -> Result<Vec<Statement>, Diagnostic> {
    let state = ParseState::new(config, source, tokens);
    let mut input = Stateful {
        input: TokenSlice::new(tokens),
        state: &state,
    };

    match program.parse_next(&mut input) {
        Ok(statements) => Ok(statements),
        Err(e) => {
            let remaining = input.eof_offset();
            Err(convert_error(e, &state, remaining))
        }
    }
}
