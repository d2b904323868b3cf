//! Assembly of parsed statements into modules and queries.

use rego_core::{Body, ExprTerms, Head, Location, Module, Package, Rule, Span, Statement, Value, Var};

use crate::{
    config::ParseConfig,
    error::{Diagnostic, ErrorCode},
    source::SourceFile,
};

/// Name of a statement kind as used in diagnostics.
fn kind(statement: &Statement) -> &'static str {
    match statement {
        Statement::Package(_) => "package declaration",
        Statement::Import(_) => "import",
        Statement::Rules(_) => "rule",
        Statement::Body(_) => "expression",
        Statement::Comment(_) => "comment",
    }
}

/// Source span covered by a statement.
fn statement_span(statement: &Statement) -> Option<Span> {
    match statement {
        Statement::Package(package) => package.location.as_ref().map(Location::span),
        Statement::Import(import) => import.location.as_ref().map(Location::span),
        Statement::Rules(rules) => rules.first()?.head.location.as_ref().map(Location::span),
        Statement::Body(body) => body_span(body),
        Statement::Comment(comment) => comment.location.as_ref().map(Location::span),
    }
}

fn body_span(body: &Body) -> Option<Span> {
    let first = body.exprs().first()?.location.as_ref()?.span();
    let last = body.exprs().last()?.location.as_ref()?.span();
    Some(first.union(last))
}

/// Diagnostic pointing at a statement's span, or at the end of the source.
fn misplaced(
    code: ErrorCode,
    message: String,
    span: Option<Span>,
    source: &SourceFile,
) -> Diagnostic {
    let span = span.unwrap_or_else(|| source.end_span());
    Diagnostic::error(code, message)
        .with_label(span, code.description())
        .with_location(source.location(span))
}

/// The rule `name = value { true }` for a top-level `name = value`.
///
/// Only a single, non-negated, `with`-free equality whose left side is a
/// variable qualifies.
fn constant_rule(body: &Body, config: &ParseConfig) -> Option<Rule> {
    let [expr] = body.exprs() else {
        return None;
    };
    if expr.negated || !expr.with.is_empty() {
        return None;
    }
    let ExprTerms::Call(terms) = &expr.terms else {
        return None;
    };
    let [operator, name, value] = terms.as_slice() else {
        return None;
    };

    let Value::Ref(reference) = &operator.value else {
        return None;
    };
    let equality = config.builtins().operator_name("=");
    if !reference.path.is_empty() || reference.head_var().map(Var::as_str) != Some(equality) {
        return None;
    }

    let head = Head {
        name: name.value.as_var()?.clone(),
        key: None,
        value: Some(value.clone()),
        location: expr.location.clone(),
    };
    Some(Rule {
        default: false,
        head,
        body: Body::truthy(expr.location.clone()),
    })
}

/// Build a module: one leading package, then imports and rules.
pub(crate) fn assemble_module(
    statements: Vec<Statement>,
    source: &SourceFile,
    config: &ParseConfig,
) -> Result<Module, Diagnostic> {
    let mut package: Option<Package> = None;
    let mut imports = Vec::new();
    let mut rules = Vec::new();
    let mut comments = Vec::new();

    for statement in statements {
        let Some(declared) = &package else {
            match statement {
                Statement::Comment(comment) => comments.push(comment),
                Statement::Package(first) => package = Some(first),
                other => {
                    return Err(misplaced(
                        ErrorCode::E206,
                        format!("expected package declaration before {}", kind(&other)),
                        statement_span(&other),
                        source,
                    )
                    .with_help("start the module with `package <name>`"));
                }
            }
            continue;
        };

        match statement {
            Statement::Comment(comment) => comments.push(comment),
            Statement::Import(import) => imports.push(import),
            Statement::Rules(defined) => rules.extend(defined),
            Statement::Body(body) => match constant_rule(&body, config) {
                Some(rule) => rules.push(rule),
                None => {
                    return Err(misplaced(
                        ErrorCode::E207,
                        format!("expression is not a rule: {body}"),
                        body_span(&body),
                        source,
                    )
                    .with_help("wrap the expression in a rule, e.g. `allow { ... }`"));
                }
            },
            other @ Statement::Package(_) => {
                return Err(misplaced(
                    ErrorCode::E206,
                    format!(
                        "unexpected package declaration: module already declares package {declared}"
                    ),
                    statement_span(&other),
                    source,
                )
                .with_help("a module declares exactly one package"));
            }
        }
    }

    match package {
        Some(package) => Ok(Module {
            package,
            imports,
            rules,
            comments,
        }),
        None => {
            let span = source.end_span();
            Err(Diagnostic::error(ErrorCode::E206, "empty module: missing package declaration")
                .with_label(span, ErrorCode::E206.description())
                .with_location(source.location(span))
                .with_help("start the module with `package <name>`"))
        }
    }
}

/// Concatenate the bodies of a query, in order.
pub(crate) fn assemble_query(
    statements: Vec<Statement>,
    source: &SourceFile,
) -> Result<Body, Diagnostic> {
    let mut query: Option<Body> = None;

    for statement in statements {
        match statement {
            Statement::Comment(_) => {}
            Statement::Body(body) => {
                query = Some(match query.take() {
                    Some(mut query) => {
                        query.extend(body);
                        query
                    }
                    None => body,
                });
            }
            other => {
                return Err(misplaced(
                    ErrorCode::E208,
                    format!("{} is not allowed in a query", kind(&other)),
                    statement_span(&other),
                    source,
                )
                .with_help("a query consists of expressions only"));
            }
        }
    }

    query.ok_or_else(|| {
        let span = source.end_span();
        Diagnostic::error(ErrorCode::E208, "empty query")
            .with_label(span, ErrorCode::E208.description())
            .with_location(source.location(span))
    })
}
