// zilf-core - Error types for the evaluator core
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Error types for the evaluator core.

use std::fmt;

use thiserror::Error;
use zilf_value::LayoutError;

/// Result type for evaluator core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which value cell a lookup asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Local,
    Global,
    LocalOrGlobal,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Local => "local",
            Axis::Global => "global",
            Axis::LocalOrGlobal => "local or global",
        })
    }
}

/// Specification for expected arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AritySpec {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl AritySpec {
    pub fn from_bounds(min: usize, max: Option<usize>) -> Self {
        match max {
            None => AritySpec::AtLeast(min),
            Some(max) if max == min => AritySpec::Exact(min),
            Some(max) => AritySpec::Range(min, max),
        }
    }

    #[must_use]
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            AritySpec::Exact(e) => n == e,
            AritySpec::AtLeast(min) => n >= min,
            AritySpec::Range(min, max) => (min..=max).contains(&n),
        }
    }
}

impl fmt::Display for AritySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AritySpec::Exact(n) => write!(f, "{}", n),
            AritySpec::AtLeast(n) => write!(f, "at least {}", n),
            AritySpec::Range(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

/// The error taxonomy hosts dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnboundAtom,
    NamespaceConflict,
    MisplacedOperation,
    DeclarationViolation,
    ReadOnlyField,
    WrongArgumentCount,
    TypeConstraintViolation,
    NotApplicable,
    OutOfRange,
    BadSyntax,
    LimitExceeded,
    Internal,
}

/// Errors raised by the evaluator core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("atom {atom} has no {axis} value")]
    UnboundAtom { atom: String, axis: Axis },

    #[error("atom {atom} is already on OBLIST {oblist}")]
    AtomOnOtherObList { atom: String, oblist: String },

    #[error("OBLIST {oblist} already contains an atom named {name}")]
    DuplicateAtomName { name: String, oblist: String },

    #[error("misplaced {operation}: {message}")]
    Misplaced {
        operation: &'static str,
        message: String,
    },

    #[error("{target}: value {value} violates declaration {decl}")]
    DeclViolation {
        target: String,
        value: String,
        decl: String,
    },

    #[error("{type_name} field {field} is read-only")]
    ReadOnlyField {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("wrong number of arguments to {name}: expected {expected}, got {got}")]
    ArityError {
        name: String,
        expected: AritySpec,
        got: usize,
    },

    #[error("{name}: argument {param} must be {expected}, got {got}")]
    TypeConstraint {
        name: String,
        param: String,
        expected: String,
        got: String,
    },

    #[error("not applicable: {value}")]
    NotApplicable { value: String },

    #[error("index {index} out of range for structure of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    #[error("bad {form} syntax: {message}")]
    BadSyntax {
        form: &'static str,
        message: String,
    },

    #[error("macro expansion exceeded depth {limit}")]
    ExpansionDepth { limit: usize },

    #[error("evaluation exceeded depth {limit}")]
    EvalDepth { limit: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnboundAtom { .. } => ErrorKind::UnboundAtom,
            Error::AtomOnOtherObList { .. } | Error::DuplicateAtomName { .. } => {
                ErrorKind::NamespaceConflict
            }
            Error::Misplaced { .. } => ErrorKind::MisplacedOperation,
            Error::DeclViolation { .. } => ErrorKind::DeclarationViolation,
            Error::ReadOnlyField { .. } => ErrorKind::ReadOnlyField,
            Error::ArityError { .. } => ErrorKind::WrongArgumentCount,
            Error::TypeConstraint { .. } => ErrorKind::TypeConstraintViolation,
            Error::NotApplicable { .. } => ErrorKind::NotApplicable,
            Error::IndexOutOfRange { .. } => ErrorKind::OutOfRange,
            Error::BadSyntax { .. } => ErrorKind::BadSyntax,
            Error::ExpansionDepth { .. } | Error::EvalDepth { .. } => ErrorKind::LimitExceeded,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Language-level errors can be reported and skipped; internal ones cannot.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Internal(_))
    }

    /// Create an arity error naming the procedure.
    pub fn arity(name: impl Into<String>, expected: AritySpec, got: usize) -> Self {
        Error::ArityError {
            name: name.into(),
            expected,
            got,
        }
    }

    /// Create a type constraint error.
    pub fn type_constraint(
        name: impl Into<String>,
        param: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Error::TypeConstraint {
            name: name.into(),
            param: param.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create a syntax error.
    pub fn syntax(form: &'static str, message: impl Into<String>) -> Self {
        Error::BadSyntax {
            form,
            message: message.into(),
        }
    }

    pub fn misplaced(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Misplaced {
            operation,
            message: message.into(),
        }
    }
}

impl From<LayoutError> for Error {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::ReadOnlyField { type_name, field } => {
                Error::ReadOnlyField { type_name, field }
            }
            LayoutError::WrongFieldType {
                type_name,
                field,
                expected,
                got,
            } => Error::type_constraint(type_name, field, expected, got),
            LayoutError::InvalidField {
                type_name,
                field,
                message,
            } => Error::syntax(type_name, format!("{}: {}", field, message)),
            LayoutError::IndexOutOfRange { index, length } => {
                Error::IndexOutOfRange { index, length }
            }
        }
    }
}
