//! Problems reported by static type checking
//!
//! Problems are plain data: a location, a severity and a detail from a closed
//! set. Type checking problems are accumulated while inference continues;
//! scope and structural problems also exist as fatal [`SemanticError`]s and
//! convert into problems for uniform reporting.

use crate::StaticType;
use pql_diagnostics::{
    Diagnostic, ErrorCode, PQL0001, PQL0002, PQL0003, PQL0100, PQL0101, PQL0102, PQL0200,
    PQL0201, PQL0202, PQL0203, PQL0204, PQL0205, PQL0206, PQL0207, SemanticError, Severity,
    SourceLocation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Accepted argument count of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArityRange {
    pub min: usize,
    /// `None` for variadic functions
    pub max: Option<usize>,
}

impl ArityRange {
    pub const fn contains(&self, count: usize) -> bool {
        count >= self.min
            && match self.max {
                Some(max) => count <= max,
                None => true,
            }
    }
}

impl fmt::Display for ArityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{}..{max}", self.min),
            None => write!(f, "{}..", self.min),
        }
    }
}

fn join_types(types: &[StaticType]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProblemDetail {
    #[error("data type mismatch for {op}: {}", join_types(.arg_types))]
    DataTypeMismatch {
        arg_types: Vec<StaticType>,
        op: String,
    },

    #[error("expression always returns null or missing")]
    AlwaysReturnsNullOrMissing,

    #[error("incompatible data type for expression: expected {expected}, found {actual}")]
    IncompatibleDataTypeForExpr {
        expected: StaticType,
        actual: StaticType,
    },

    #[error("invalid argument type for {function}: expected {expected}, found {actual}")]
    InvalidArgumentTypeForFunction {
        function: String,
        expected: StaticType,
        actual: StaticType,
    },

    #[error("null or missing argument to {function}")]
    NullOrMissingFunctionArgument { function: String },

    #[error("{function} expects {expected} arguments, found {actual}")]
    IncorrectNumberOfArguments {
        function: String,
        expected: ArityRange,
        actual: usize,
    },

    #[error("no such function: {function}")]
    NoSuchFunction { function: String },

    #[error("duplicate alias in select list: {alias}")]
    DuplicateAliasInSelectList { alias: String },

    #[error("no such binding: {name}")]
    UnboundBinding { name: String },

    #[error("ambiguous binding: {name}")]
    AmbiguousBinding { name: String },

    #[error("global variable access is not allowed here: {name}")]
    IllegalGlobalVariableAccess { name: String },

    #[error("integer literal is out of range")]
    IntegerOverflow,

    #[error("unsupported feature: {feature}")]
    UnsupportedFeature { feature: String },

    #[error("HAVING is only allowed together with a non-empty GROUP BY")]
    HavingWithoutGroupBy,
}

impl ProblemDetail {
    /// Default severity of this kind of problem
    pub fn severity(&self) -> Severity {
        match self {
            Self::AlwaysReturnsNullOrMissing => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Stable error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::IntegerOverflow => PQL0001,
            Self::UnsupportedFeature { .. } => PQL0002,
            Self::HavingWithoutGroupBy => PQL0003,
            Self::UnboundBinding { .. } => PQL0100,
            Self::AmbiguousBinding { .. } => PQL0101,
            Self::IllegalGlobalVariableAccess { .. } => PQL0102,
            Self::DataTypeMismatch { .. } => PQL0200,
            Self::AlwaysReturnsNullOrMissing => PQL0201,
            Self::IncompatibleDataTypeForExpr { .. } => PQL0202,
            Self::InvalidArgumentTypeForFunction { .. } => PQL0203,
            Self::NullOrMissingFunctionArgument { .. } => PQL0204,
            Self::IncorrectNumberOfArguments { .. } => PQL0205,
            Self::NoSuchFunction { .. } => PQL0206,
            Self::DuplicateAliasInSelectList { .. } => PQL0207,
        }
    }
}

/// A located problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub location: SourceLocation,
    pub severity: Severity,
    pub detail: ProblemDetail,
}

impl Problem {
    /// Create a problem with the detail's default severity
    pub fn new(location: SourceLocation, detail: ProblemDetail) -> Self {
        Self {
            location,
            severity: detail.severity(),
            detail,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Convert a fatal error into a problem
    ///
    /// Internal and configuration errors have no problem counterpart.
    pub fn from_fatal(error: &SemanticError) -> Option<Self> {
        let detail = match error {
            SemanticError::IntegerOverflow { .. } => ProblemDetail::IntegerOverflow,
            SemanticError::UnsupportedFeature { feature, .. } => ProblemDetail::UnsupportedFeature {
                feature: feature.clone(),
            },
            SemanticError::HavingWithoutGroupBy { .. } => ProblemDetail::HavingWithoutGroupBy,
            SemanticError::UnboundBinding { name, .. } => {
                ProblemDetail::UnboundBinding { name: name.clone() }
            }
            SemanticError::AmbiguousBinding { name, .. } => {
                ProblemDetail::AmbiguousBinding { name: name.clone() }
            }
            SemanticError::IllegalGlobalVariableAccess { name, .. } => {
                ProblemDetail::IllegalGlobalVariableAccess { name: name.clone() }
            }
            SemanticError::MissingMetadata { .. } | SemanticError::Configuration { .. } => {
                return None;
            }
        };
        let location = error.location().copied().unwrap_or_default();
        Some(Self::new(location, detail))
    }

    /// Convert to a diagnostic for display
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = match self.severity {
            Severity::Error => Diagnostic::error(self.detail.code(), self.detail.to_string()),
            Severity::Warning => Diagnostic::warning(self.detail.code(), self.detail.to_string()),
        };
        diag.with_location(self.location)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.detail, self.location)
    }
}
