//! Structural checks applied while statements are built.
//!
//! Every check runs on an already matched node and returns the diagnostic
//! that aborts the parse when the node breaks a language rule.

use rego_core::{
    DEFAULT_ROOT_DOCUMENT, Head, ImportPathValidator, Location, Ref, Span, Term, Value,
};

use crate::error::{Diagnostic, ErrorCode};

/// Build a diagnostic whose primary label covers `term`.
fn at_term(code: ErrorCode, message: String, term: &Term, label: &str) -> Diagnostic {
    let diag = Diagnostic::error(code, message);
    match &term.location {
        Some(location) => diag
            .with_label(location.span(), label)
            .with_location(location.clone()),
        None => diag,
    }
}

/// Turn a declared package name into its full path under the root document.
///
/// A variable `a` becomes `data.a`. For a ref `a.b.c` the head becomes the
/// string `"a"` and every further segment must be a ground string.
pub(crate) fn package_path(name: Term) -> Result<Ref, Diagnostic> {
    let root = Term {
        value: Value::Var(DEFAULT_ROOT_DOCUMENT.into()),
        location: name.location.clone(),
    };

    match name.value {
        Value::Var(var) => {
            let segment = Term {
                value: Value::String(var.as_str().to_string()),
                location: name.location,
            };
            Ok(Ref::new(root, vec![segment]))
        }
        Value::Ref(reference) => {
            let display = reference.to_string();
            let Ref { head, path: tail } = reference;

            if let Some(segment) = tail.iter().find(|t| !t.is_ground()) {
                return Err(at_term(
                    ErrorCode::E200,
                    format!("package name cannot contain variables: {display}"),
                    segment,
                    "variable in package path",
                )
                .with_help("package paths must be ground"));
            }
            if let Some(segment) = tail.iter().find(|t| t.value.as_string().is_none()) {
                return Err(at_term(
                    ErrorCode::E201,
                    format!("package name cannot contain non-string values: {display}"),
                    segment,
                    &format!("{} in package path", segment.value.type_name()),
                )
                .with_help("use dotted names or string keys only"));
            }

            let Term { value, location } = *head;
            let head = match value {
                Value::Var(var) => Term {
                    value: Value::String(var.as_str().to_string()),
                    location,
                },
                value => Term { value, location },
            };

            let mut path = Vec::with_capacity(tail.len() + 1);
            path.push(head);
            path.extend(tail);
            Ok(Ref::new(root, path))
        }
        value => {
            let term = Term {
                value,
                location: name.location,
            };
            Err(at_term(
                ErrorCode::E201,
                format!("package name must be a variable or reference: {term}"),
                &term,
                "not a package name",
            ))
        }
    }
}

/// Default values must be constants: no variables or references outside of
/// comprehensions.
pub(crate) fn check_default_value(value: &Term) -> Result<(), Diagnostic> {
    let mut offender: Option<Term> = None;
    value.walk(&mut |term: &Term| {
        if offender.is_some() {
            return true;
        }
        match term.value {
            Value::ArrayComprehension(_) => true,
            Value::Var(_) | Value::Ref(_) => {
                offender = Some(term.clone());
                true
            }
            _ => false,
        }
    });

    match offender {
        None => Ok(()),
        Some(term) => Err(at_term(
            ErrorCode::E203,
            format!(
                "default rule value cannot contain {}",
                term.value.type_name()
            ),
            &term,
            "not a constant",
        )
        .with_help("default values must be constants")),
    }
}

/// With both a key and a value, the key must be a variable, string or ref.
pub(crate) fn check_head_key(head: &Head) -> Result<(), Diagnostic> {
    let (Some(key), Some(_)) = (&head.key, &head.value) else {
        return Ok(());
    };
    match key.value {
        Value::Var(_) | Value::String(_) | Value::Ref(_) => Ok(()),
        ref other => {
            let diag = at_term(
                ErrorCode::E202,
                format!(
                    "head key must be one of var, string, or ref if value exists (not {})",
                    other.type_name()
                ),
                key,
                "illegal key",
            );
            Err(match &head.location {
                Some(location) => diag.with_secondary_label(location.span(), "in this rule head"),
                None => diag,
            })
        }
    }
}

/// Apply the configured legality predicate to an import path or `with` target.
pub(crate) fn check_import_path(
    path: &Term,
    validator: &(dyn ImportPathValidator + Send + Sync),
) -> Result<(), Diagnostic> {
    validator.validate(path).map_err(|err| {
        at_term(ErrorCode::E204, err.to_string(), path, "invalid path").with_help(err.reason)
    })
}

/// Diagnostic for `{}` after a rule head.
pub(crate) fn empty_body(span: Span, location: Location) -> Diagnostic {
    Diagnostic::error(ErrorCode::E205, "body must be non-empty")
        .with_label(span, "empty body")
        .with_location(location)
        .with_help("add at least one expression, e.g. `true`")
}
