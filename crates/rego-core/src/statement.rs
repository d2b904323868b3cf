//! Statement-level AST nodes: literals, bodies, rules, packages, imports.
//!
//! As with [`Term`], equality on these nodes is structural and ignores
//! locations.

use std::fmt;

use serde::Serialize;

use crate::{
    location::Location,
    term::{Ref, Term, Var},
};

/// The term content of an [`Expr`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExprTerms {
    /// A single term, e.g. `input.allowed`.
    Term(Term),
    /// A call in canonical prefix form: operator first, then operands.
    ///
    /// Infix syntax is desugared into this shape, so `x = 1 + 2` becomes
    /// `[plus, 1, 2, x]`.
    Call(Vec<Term>),
}

/// One literal of a body.
#[derive(Debug, Clone, Serialize)]
pub struct Expr {
    pub terms: ExprTerms,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub negated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub with: Vec<With>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Expr {
    /// Expression consisting of a single term.
    pub fn term(term: Term) -> Self {
        Self::new(ExprTerms::Term(term))
    }

    /// Expression in call form.
    pub fn call(terms: Vec<Term>) -> Self {
        Self::new(ExprTerms::Call(terms))
    }

    fn new(terms: ExprTerms) -> Self {
        Self {
            terms,
            negated: false,
            with: Vec::new(),
            location: None,
        }
    }

    /// The call operator, for call expressions.
    pub fn operator(&self) -> Option<&Term> {
        match &self.terms {
            ExprTerms::Call(terms) => terms.first(),
            ExprTerms::Term(_) => None,
        }
    }

    /// The call operands, for call expressions.
    pub fn operands(&self) -> &[Term] {
        match &self.terms {
            ExprTerms::Call(terms) => terms.get(1..).unwrap_or_default(),
            ExprTerms::Term(_) => &[],
        }
    }

    pub fn is_ground(&self) -> bool {
        let terms_ground = match &self.terms {
            ExprTerms::Term(term) => term.is_ground(),
            ExprTerms::Call(terms) => terms.iter().skip(1).all(Term::is_ground),
        };
        terms_ground
            && self
                .with
                .iter()
                .all(|w| w.target.is_ground() && w.value.is_ground())
    }

    /// Visit every term of the expression, `with` modifiers included.
    ///
    /// See [`Term::walk`].
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&Term) -> bool,
    {
        match &self.terms {
            ExprTerms::Term(term) => term.walk(visit),
            ExprTerms::Call(terms) => terms.iter().for_each(|t| t.walk(visit)),
        }
        for with in &self.with {
            with.target.walk(visit);
            with.value.walk(visit);
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.terms == other.terms && self.negated == other.negated && self.with == other.with
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("not ")?;
        }
        match &self.terms {
            ExprTerms::Term(term) => write!(f, "{term}")?,
            ExprTerms::Call(terms) => {
                let (operator, operands) = terms.split_first().ok_or(fmt::Error)?;
                write!(f, "{operator}(")?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{operand}")?;
                }
                f.write_str(")")?;
            }
        }
        for with in &self.with {
            write!(f, " {with}")?;
        }
        Ok(())
    }
}

/// `with target as value` modifier on a literal.
#[derive(Debug, Clone, Serialize)]
pub struct With {
    pub target: Term,
    pub value: Term,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl PartialEq for With {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target && self.value == other.value
    }
}

impl fmt::Display for With {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "with {} as {}", self.target, self.value)
    }
}

/// Ordered conjunction of literals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Body(Vec<Expr>);

impl Body {
    pub fn new(exprs: Vec<Expr>) -> Self {
        Self(exprs)
    }

    /// Body of rules that have none in the source: the single literal `true`.
    pub fn truthy(location: Option<Location>) -> Self {
        let mut term = Term::boolean(true);
        term.location = location.clone();
        let mut expr = Expr::term(term);
        expr.location = location;
        Self(vec![expr])
    }

    pub fn exprs(&self) -> &[Expr] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Expr> {
        self.0.iter()
    }

    /// Append the literals of `other`.
    pub fn extend(&mut self, other: Body) {
        self.0.extend(other.0);
    }

    pub fn into_exprs(self) -> Vec<Expr> {
        self.0
    }

    pub fn is_ground(&self) -> bool {
        self.0.iter().all(Expr::is_ground)
    }

    /// Visit every term of every literal. See [`Term::walk`].
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&Term) -> bool,
    {
        self.0.iter().for_each(|expr| expr.walk(visit));
    }
}

impl<'a> IntoIterator for &'a Body {
    type Item = &'a Expr;
    type IntoIter = std::slice::Iter<'a, Expr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}

/// Declared shape of a rule: `name[key] = value`.
#[derive(Debug, Clone, Serialize)]
pub struct Head {
    pub name: Var,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Term>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Term>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Head {
    pub fn new(name: Var) -> Self {
        Self {
            name,
            key: None,
            value: None,
            location: None,
        }
    }
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.key == other.key && self.value == other.value
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(key) = &self.key {
            write!(f, "[{key}]")?;
        }
        if let Some(value) = &self.value {
            write!(f, " = {value}")?;
        }
        Ok(())
    }
}

/// One head bound to one body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,
    pub head: Head,
    pub body: Body,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.default {
            return write!(f, "default {}", self.head);
        }
        write!(f, "{} {{ {} }}", self.head, self.body)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Package {
    /// Full path, rooted at the `data` document.
    pub path: Ref,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The root segment is implicit in source form.
        f.write_str("package ")?;
        for (i, segment) in self.path.path.iter().enumerate() {
            match (i, segment.value.as_string()) {
                (0, Some(s)) => f.write_str(s)?,
                (_, Some(s)) => write!(f, ".{s}")?,
                _ => write!(f, "[{segment}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Import {
    pub path: Term,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<Var>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl PartialEq for Import {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.alias == other.alias
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import {}", self.path)?;
        if let Some(alias) = &self.alias {
            write!(f, " as {alias}")?;
        }
        Ok(())
    }
}

/// A `#` line comment. `text` excludes the leading `#`.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl PartialEq for Comment {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

/// Top-level program element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Statement {
    Package(Package),
    Import(Import),
    /// All rules produced by one rule definition (one per body).
    Rules(Vec<Rule>),
    Body(Body),
    Comment(Comment),
}

impl Statement {
    /// Byte offset of the statement's start, when located.
    pub fn offset(&self) -> Option<usize> {
        let location = match self {
            Statement::Package(package) => package.location.as_ref(),
            Statement::Import(import) => import.location.as_ref(),
            Statement::Rules(rules) => rules.first().and_then(|r| r.head.location.as_ref()),
            Statement::Body(body) => body.exprs().first().and_then(|e| e.location.as_ref()),
            Statement::Comment(comment) => comment.location.as_ref(),
        };
        location.map(|l| l.span().start())
    }
}

/// A parsed policy module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub package: Package,
    pub imports: Vec<Import>,
    pub rules: Vec<Rule>,
    pub comments: Vec<Comment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_ref(field: &str) -> Term {
        Term::reference(Ref::new(Term::var("input"), vec![Term::string(field)]))
    }

    fn eq_call(left: Term, right: Term) -> Expr {
        Expr::call(vec![
            Term::reference(Ref::new(Term::var("eq"), vec![])),
            left,
            right,
        ])
    }

    #[test]
    fn test_expr_operator_and_operands() {
        let expr = eq_call(Term::var("x"), Term::string("a"));
        assert_eq!(expr.operator().map(ToString::to_string).as_deref(), Some("eq"));
        assert_eq!(expr.operands().len(), 2);

        let plain = Expr::term(Term::boolean(true));
        assert!(plain.operator().is_none());
        assert!(plain.operands().is_empty());
    }

    #[test]
    fn test_expr_display() {
        let mut expr = eq_call(input_ref("user"), Term::string("bob"));
        expr.negated = true;
        expr.with.push(With {
            target: input_ref("user"),
            value: Term::string("alice"),
            location: None,
        });
        assert_eq!(
            expr.to_string(),
            r#"not eq(input.user, "bob") with input.user as "alice""#
        );
    }

    #[test]
    fn test_truthy_body() {
        let body = Body::truthy(None);
        assert_eq!(body.len(), 1);
        assert_eq!(body.to_string(), "true");
    }

    #[test]
    fn test_body_groundness_skips_operator() {
        let ground = Body::new(vec![eq_call(input_ref("a"), Term::string("b"))]);
        assert!(ground.is_ground());

        let free = Body::new(vec![eq_call(Term::var("x"), Term::string("b"))]);
        assert!(!free.is_ground());
    }

    #[test]
    fn test_head_copies_are_independent() {
        let mut head = Head::new(Var::new("p"));
        head.value = Some(Term::boolean(true));
        let first = Rule {
            default: false,
            head: head.clone(),
            body: Body::truthy(None),
        };
        let mut second = first.clone();
        second.head.value = Some(Term::boolean(false));

        assert_eq!(first.head.value, Some(Term::boolean(true)));
        assert_ne!(first, second);
    }

    #[test]
    fn test_package_display_hides_root() {
        let package = Package {
            path: Ref::new(
                Term::var("data"),
                vec![Term::string("a"), Term::string("b")],
            ),
            location: None,
        };
        assert_eq!(package.to_string(), "package a.b");
    }

    #[test]
    fn test_statement_json_is_tagged() {
        let statement = Statement::Comment(Comment {
            text: " hello".to_string(),
            location: None,
        });
        let json = serde_json::to_value(&statement).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "comment", "value": {"text": " hello"}})
        );
    }
}
