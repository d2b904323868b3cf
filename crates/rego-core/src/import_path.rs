//! Legality of `import` paths and `with` targets.

use thiserror::Error;

use crate::term::{Term, Value};

/// Root documents every import must start from by default.
pub const DEFAULT_ROOTS: &[&str] = &["data", "input"];

/// Why a path was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path {path}: {reason}")]
pub struct ImportPathError {
    pub path: String,
    pub reason: String,
}

impl ImportPathError {
    pub fn new(path: &Term, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Predicate applied to import paths and `with` targets.
pub trait ImportPathValidator {
    fn validate(&self, path: &Term) -> Result<(), ImportPathError>;
}

/// Accepts a root variable, or a ref rooted at one whose remaining segments
/// are all strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDocumentImports {
    roots: Vec<String>,
}

impl RootDocumentImports {
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    fn is_root(&self, term: &Term) -> bool {
        term.value
            .as_var()
            .is_some_and(|var| self.roots.iter().any(|root| root == var.as_str()))
    }

    fn roots_message(&self) -> String {
        format!("path must begin with {}", self.roots.join(" or "))
    }
}

impl Default for RootDocumentImports {
    fn default() -> Self {
        Self::new(DEFAULT_ROOTS.iter().copied())
    }
}

impl ImportPathValidator for RootDocumentImports {
    fn validate(&self, path: &Term) -> Result<(), ImportPathError> {
        match &path.value {
            Value::Var(_) if self.is_root(path) => Ok(()),
            Value::Var(_) => Err(ImportPathError::new(path, self.roots_message())),
            Value::Ref(reference) => {
                if !self.is_root(&reference.head) {
                    return Err(ImportPathError::new(path, self.roots_message()));
                }
                match reference.path.iter().find(|s| s.value.as_string().is_none()) {
                    Some(segment) => Err(ImportPathError::new(
                        path,
                        format!(
                            "path elements must be strings, found {}",
                            segment.value.type_name()
                        ),
                    )),
                    None => Ok(()),
                }
            }
            other => Err(ImportPathError::new(
                path,
                format!("path must be a var or ref, found {}", other.type_name()),
            )),
        }
    }
}

impl<F> ImportPathValidator for F
where
    F: Fn(&Term) -> Result<(), ImportPathError>,
{
    fn validate(&self, path: &Term) -> Result<(), ImportPathError> {
        self(path)
    }
}
