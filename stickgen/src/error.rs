use std::fmt;

use stick_syntax::{LoadError, ParseError};

/// Which statement referenced another template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Extends,
    Include,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Extends => write!(f, "extends"),
            ReferenceKind::Include => write!(f, "include"),
        }
    }
}

/// Any failure aborts the whole generate call.
#[derive(Debug)]
pub enum GenerateError {
    Load(LoadError),
    Syntax {
        name: String,
        /// Template source, kept for rendering diagnostics.
        source: String,
        error: ParseError,
    },
    /// An extends/include target that is not a string literal.
    UnresolvableReference {
        template: String,
        kind: ReferenceKind,
        target: String,
    },
    UnsupportedConstruct { construct: String },
    /// `chain` ends with the template that re-entered it.
    CycleDetected { chain: Vec<String> },
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Load(err) => write!(f, "{}", err),
            GenerateError::Syntax { name, error, .. } => {
                write!(f, "syntax error in '{}': {}", name, error.message)
            }
            GenerateError::UnresolvableReference {
                template,
                kind,
                target,
            } => write!(
                f,
                "unable to evaluate {} reference `{}` in '{}': only string literals are supported",
                kind, target, template
            ),
            GenerateError::UnsupportedConstruct { construct } => {
                write!(f, "unsupported construct: {}", construct)
            }
            GenerateError::CycleDetected { chain } => {
                write!(f, "template inheritance cycle: {}", chain.join(" -> "))
            }
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerateError::Load(err) => Some(err),
            GenerateError::Syntax { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<LoadError> for GenerateError {
    fn from(err: LoadError) -> Self {
        GenerateError::Load(err)
    }
}
