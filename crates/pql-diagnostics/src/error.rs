//! Diagnostic and fatal error types

use crate::{
    ErrorCode, SourceLocation, PQL0001, PQL0002, PQL0003, PQL0100, PQL0101, PQL0102, PQL0400,
    PQL0401,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the query is not well typed
    Error,
    /// Warning - the query is well typed but suspicious
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with location and context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Source location
    pub location: Option<SourceLocation>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            location: None,
            help: code.info().help.map(str::to_string),
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message)
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render with terminal colors
    #[cfg(feature = "colored")]
    pub fn to_colored_string(&self) -> String {
        use colored::Colorize;

        let severity = match self.severity {
            Severity::Error => self.severity.to_string().red().bold(),
            Severity::Warning => self.severity.to_string().yellow().bold(),
        };
        let mut out = format!("{}: {} - {}", severity, self.code.to_string().bold(), self.message);
        if let Some(loc) = &self.location {
            out.push_str(&format!(" at {}", loc.to_string().cyan()));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  {}: {}", "help".green(), help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// Fatal semantic errors
///
/// Structural violations found by the sanity validator and scope resolution
/// failures abort the run immediately; no result type is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    /// Integer literal does not fit the representable integer range
    #[error("integer literal {literal} is out of range")]
    IntegerOverflow {
        literal: String,
        location: SourceLocation,
    },

    /// Construct that is recognized but not supported
    #[error("unsupported feature: {feature}")]
    UnsupportedFeature {
        feature: String,
        location: SourceLocation,
    },

    /// HAVING clause without a GROUP BY clause with at least one key
    #[error("HAVING is only allowed together with a non-empty GROUP BY")]
    HavingWithoutGroupBy { location: SourceLocation },

    /// Identifier that resolves to no binding
    #[error("no such binding: {name}")]
    UnboundBinding {
        name: String,
        location: SourceLocation,
    },

    /// Identifier or alias that resolves to more than one binding
    #[error("ambiguous binding: {name}")]
    AmbiguousBinding {
        name: String,
        location: SourceLocation,
    },

    /// Global variable referenced where configured constraints forbid it
    #[error("global variable access is not allowed here: {name}")]
    IllegalGlobalVariableAccess {
        name: String,
        location: SourceLocation,
    },

    /// A pass ran without metadata that an earlier pass must provide
    #[error("missing normalization metadata: {what}")]
    MissingMetadata {
        what: String,
        location: SourceLocation,
    },

    /// Options could not be loaded
    #[error("invalid configuration: {message}")]
    Configuration { message: String },
}

impl SemanticError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::IntegerOverflow { .. } => PQL0001,
            Self::UnsupportedFeature { .. } => PQL0002,
            Self::HavingWithoutGroupBy { .. } => PQL0003,
            Self::UnboundBinding { .. } => PQL0100,
            Self::AmbiguousBinding { .. } => PQL0101,
            Self::IllegalGlobalVariableAccess { .. } => PQL0102,
            Self::MissingMetadata { .. } => PQL0400,
            Self::Configuration { .. } => PQL0401,
        }
    }

    /// Get the location if available
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::IntegerOverflow { location, .. }
            | Self::UnsupportedFeature { location, .. }
            | Self::HavingWithoutGroupBy { location }
            | Self::UnboundBinding { location, .. }
            | Self::AmbiguousBinding { location, .. }
            | Self::IllegalGlobalVariableAccess { location, .. }
            | Self::MissingMetadata { location, .. } => Some(location),
            Self::Configuration { .. } => None,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string());
        match self.location() {
            Some(loc) => diag.with_location(*loc),
            None => diag,
        }
    }
}
