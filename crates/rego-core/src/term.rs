//! Value-shaped AST nodes.
//!
//! A [`Term`] pairs a [`Value`] with the [`Location`] it was parsed from.
//! Terms own their children; refs and comprehensions nest by value, so a
//! term tree never shares nodes and never contains cycles.
//!
//! Equality on terms is structural and ignores locations: `a.b` and
//! `a["b"]` compare equal even though their source text differs.

use std::fmt;

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{location::Location, statement::Body};

/// Arbitrary precision number literal.
///
/// The exact decimal text of the literal is kept; nothing is rounded through
/// a fixed-width float.
pub type Number = serde_json::Number;

/// A variable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Var(String);

impl Var {
    /// Create a variable with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The variable name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Var {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A reference: a variable head followed by a non-empty access path.
///
/// Dot access is sugar for bracket access with a string key, so `a.b`
/// is stored exactly like `a["b"]`. Operator terms of calls are refs with an
/// empty path.
#[derive(Debug, Clone, PartialEq)]
pub struct Ref {
    /// Head term; always holds a [`Value::Var`].
    pub head: Box<Term>,
    /// Accessors applied to the head, in order.
    pub path: Vec<Term>,
}

impl Ref {
    /// Create a ref from a head term and its path.
    pub fn new(head: Term, path: Vec<Term>) -> Self {
        Self {
            head: Box::new(head),
            path,
        }
    }

    /// The head variable, if the head holds one.
    pub fn head_var(&self) -> Option<&Var> {
        self.head.value.as_var()
    }

    /// True when no path segment contains a variable.
    pub fn is_ground(&self) -> bool {
        self.path.iter().all(Term::is_ground)
    }

    /// All segments, head first.
    pub fn segments(&self) -> impl Iterator<Item = &Term> {
        std::iter::once(self.head.as_ref()).chain(self.path.iter())
    }
}

impl Serialize for Ref {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.segments())
    }
}

/// Unordered collection of terms, deduplicated by structural equality.
///
/// Numbers compare by their literal text, so `1` and `1.0` are distinct members.
#[derive(Debug, Clone, Default)]
pub struct Set {
    elements: Vec<Term>,
}

impl Set {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a term. Returns `false` if an equal term was already present.
    pub fn insert(&mut self, term: Term) -> bool {
        if self.contains(&term) {
            return false;
        }
        self.elements.push(term);
        true
    }

    /// Check whether an equal term is a member.
    pub fn contains(&self, term: &Term) -> bool {
        self.elements.iter().any(|element| element == term)
    }

    /// Number of distinct members.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True for the empty set.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Members in first-insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.elements.iter()
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|term| other.contains(term))
    }
}

impl FromIterator<Term> for Set {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        let mut set = Set::new();
        for term in iter {
            set.insert(term);
        }
        set
    }
}

impl<'a> IntoIterator for &'a Set {
    type Item = &'a Term;
    type IntoIter = std::slice::Iter<'a, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl Serialize for Set {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// `[ term | body ]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayComprehension {
    pub term: Box<Term>,
    pub body: Body,
}

/// The value held by a [`Term`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Var(Var),
    Ref(Ref),
    Array(Vec<Term>),
    /// Key/value pairs in source order. Keys are not deduplicated.
    Object(Vec<(Term, Term)>),
    Set(Set),
    ArrayComprehension(ArrayComprehension),
}

impl Value {
    /// Name of the value's type as used in diagnostics and JSON output.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Var(_) => "var",
            Value::Ref(_) => "ref",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Set(_) => "set",
            Value::ArrayComprehension(_) => "arraycomprehension",
        }
    }

    /// The variable, if this is a [`Value::Var`].
    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Value::Var(var) => Some(var),
            _ => None,
        }
    }

    /// The string contents, if this is a [`Value::String`].
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for null, booleans, numbers and strings.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Boolean(_) | Value::Number(_) | Value::String(_)
        )
    }
}

/// A value together with the location it was parsed from.
#[derive(Debug, Clone)]
pub struct Term {
    pub value: Value,
    pub location: Option<Location>,
}

impl Term {
    /// Create a term without location.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            location: None,
        }
    }

    /// Attach a location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(Value::Boolean(value))
    }

    pub fn number(value: Number) -> Self {
        Self::new(Value::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Value::String(value.into()))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::new(Value::Var(Var::new(name)))
    }

    pub fn reference(reference: Ref) -> Self {
        Self::new(Value::Ref(reference))
    }

    pub fn array(elements: Vec<Term>) -> Self {
        Self::new(Value::Array(elements))
    }

    pub fn object(pairs: Vec<(Term, Term)>) -> Self {
        Self::new(Value::Object(pairs))
    }

    pub fn set(set: Set) -> Self {
        Self::new(Value::Set(set))
    }

    /// True when the term contains no variables.
    ///
    /// Ref heads are roots and do not count; only ref paths are inspected.
    pub fn is_ground(&self) -> bool {
        match &self.value {
            Value::Null | Value::Boolean(_) | Value::Number(_) | Value::String(_) => true,
            Value::Var(_) => false,
            Value::Ref(reference) => reference.is_ground(),
            Value::Array(elements) => elements.iter().all(Term::is_ground),
            Value::Object(pairs) => pairs.iter().all(|(k, v)| k.is_ground() && v.is_ground()),
            Value::Set(set) => set.iter().all(Term::is_ground),
            Value::ArrayComprehension(comprehension) => {
                comprehension.term.is_ground() && comprehension.body.is_ground()
            }
        }
    }

    /// Visit this term and its descendants in pre-order.
    ///
    /// When `visit` returns `true` the children of that term are skipped.
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&Term) -> bool,
    {
        if visit(self) {
            return;
        }
        match &self.value {
            Value::Null | Value::Boolean(_) | Value::Number(_) | Value::String(_) | Value::Var(_) => {}
            Value::Ref(reference) => reference.segments().for_each(|t| t.walk(visit)),
            Value::Array(elements) => elements.iter().for_each(|t| t.walk(visit)),
            Value::Object(pairs) => pairs.iter().for_each(|(k, v)| {
                k.walk(visit);
                v.walk(visit);
            }),
            Value::Set(set) => set.iter().for_each(|t| t.walk(visit)),
            Value::ArrayComprehension(comprehension) => {
                comprehension.term.walk(visit);
                comprehension.body.walk(visit);
            }
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.value.type_name())?;
        match &self.value {
            Value::Null => map.serialize_entry("value", &())?,
            Value::Boolean(b) => map.serialize_entry("value", b)?,
            Value::Number(n) => map.serialize_entry("value", n)?,
            Value::String(s) => map.serialize_entry("value", s)?,
            Value::Var(v) => map.serialize_entry("value", v)?,
            Value::Ref(r) => map.serialize_entry("value", r)?,
            Value::Array(a) => map.serialize_entry("value", a)?,
            Value::Object(o) => map.serialize_entry("value", o)?,
            Value::Set(s) => map.serialize_entry("value", s)?,
            Value::ArrayComprehension(c) => map.serialize_entry("value", c)?,
        }
        if let Some(location) = &self.location {
            map.serialize_entry("location", location)?;
        }
        map.end()
    }
}

/// True if `s` can be written as a dotted ref segment.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: impl IntoIterator<Item = T>) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        for segment in &self.path {
            match segment.value.as_string() {
                Some(s) if is_identifier(s) => write!(f, ".{s}")?,
                _ => write!(f, "[{segment}]")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => {
                let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
                f.write_str(&quoted)
            }
            Value::Var(v) => write!(f, "{v}"),
            Value::Ref(r) => write!(f, "{r}"),
            Value::Array(elements) => {
                f.write_str("[")?;
                write_joined(f, elements)?;
                f.write_str("]")
            }
            Value::Object(pairs) => {
                f.write_str("{")?;
                write_joined(f, pairs.iter().map(|(k, v)| format!("{k}: {v}")))?;
                f.write_str("}")
            }
            Value::Set(set) if set.is_empty() => f.write_str("set()"),
            Value::Set(set) => {
                f.write_str("{")?;
                write_joined(f, set)?;
                f.write_str("}")
            }
            Value::ArrayComprehension(c) => write!(f, "[{} | {}]", c.term, c.body),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Small scalar terms, so that duplicates are frequent.
    fn scalar_strategy() -> impl Strategy<Value = Term> {
        prop_oneof![
            (0u8..8).prop_map(|n| Term::number(Number::from(n))),
            "[a-c]".prop_map(Term::string),
            any::<bool>().prop_map(Term::boolean),
            Just(Term::null()),
        ]
    }

    fn terms_strategy() -> impl Strategy<Value = Vec<Term>> {
        prop::collection::vec(scalar_strategy(), 0..24)
    }

    // ===================
    // Property Test Functions
    // ===================

    /// A set holds every inserted term exactly once.
    fn check_set_deduplicates(terms: Vec<Term>) -> Result<(), TestCaseError> {
        let set: Set = terms.iter().cloned().collect();

        for term in &terms {
            prop_assert!(set.contains(term), "missing {term}");
        }
        for (i, a) in set.iter().enumerate() {
            prop_assert!(set.iter().skip(i + 1).all(|b| a != b), "duplicate {a}");
        }
        Ok(())
    }

    /// Set equality ignores insertion order.
    fn check_set_equality_ignores_order(terms: Vec<Term>) -> Result<(), TestCaseError> {
        let forward: Set = terms.iter().cloned().collect();
        let backward: Set = terms.into_iter().rev().collect();
        prop_assert_eq!(forward, backward);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn set_deduplicates(terms in terms_strategy()) {
            check_set_deduplicates(terms)?;
        }

        #[test]
        fn set_equality_ignores_order(terms in terms_strategy()) {
            check_set_equality_ignores_order(terms)?;
        }
    }
}
