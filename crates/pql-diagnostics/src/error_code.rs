//! PQL error codes following a structured numbering system
//!
//! Error code ranges:
//! - PQL0001-PQL0099: Structural errors (sanity validation)
//! - PQL0100-PQL0199: Scope and binding errors
//! - PQL0200-PQL0299: Type checking problems
//! - PQL0400-PQL0499: Internal and configuration errors

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a structural error (0001-0099)
    pub const fn is_structural_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a scope error (0100-0199)
    pub const fn is_scope_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a type checking problem (0200-0299)
    pub const fn is_type_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is an internal error (0400-0499)
    pub const fn is_internal_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PQL{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Structural errors (0001-0099)
    map.insert(1, ErrorInfo::new("Integer literal out of range"));
    map.insert(2, ErrorInfo::new("Unsupported feature"));
    map.insert(3, ErrorInfo::new("HAVING without GROUP BY")
        .with_help("Add a GROUP BY clause with at least one key or move the predicate to WHERE"));

    // Scope errors (0100-0199)
    map.insert(100, ErrorInfo::new("Unbound binding")
        .with_help("Check that the name is defined by a FROM, LET or GROUP BY clause or the global environment"));
    map.insert(101, ErrorInfo::new("Ambiguous binding"));
    map.insert(102, ErrorInfo::new("Illegal global variable access"));

    // Type checking problems (0200-0299)
    map.insert(200, ErrorInfo::new("Data type mismatch"));
    map.insert(201, ErrorInfo::new("Expression always returns null or missing"));
    map.insert(202, ErrorInfo::new("Incompatible data type for expression"));
    map.insert(203, ErrorInfo::new("Invalid argument type for function"));
    map.insert(204, ErrorInfo::new("Null or missing function argument"));
    map.insert(205, ErrorInfo::new("Incorrect number of arguments"));
    map.insert(206, ErrorInfo::new("No such function"));
    map.insert(207, ErrorInfo::new("Duplicate alias in select list"));

    // Internal errors (0400-0499)
    map.insert(400, ErrorInfo::new("Missing normalization metadata")
        .with_help("Run the full normalization pipeline before this pass"));
    map.insert(401, ErrorInfo::new("Configuration error"));

    map
});

// Structural errors
pub const PQL0001: ErrorCode = ErrorCode::new(1);
pub const PQL0002: ErrorCode = ErrorCode::new(2);
pub const PQL0003: ErrorCode = ErrorCode::new(3);

// Scope errors
pub const PQL0100: ErrorCode = ErrorCode::new(100);
pub const PQL0101: ErrorCode = ErrorCode::new(101);
pub const PQL0102: ErrorCode = ErrorCode::new(102);

// Type checking problems
pub const PQL0200: ErrorCode = ErrorCode::new(200);
pub const PQL0201: ErrorCode = ErrorCode::new(201);
pub const PQL0202: ErrorCode = ErrorCode::new(202);
pub const PQL0203: ErrorCode = ErrorCode::new(203);
pub const PQL0204: ErrorCode = ErrorCode::new(204);
pub const PQL0205: ErrorCode = ErrorCode::new(205);
pub const PQL0206: ErrorCode = ErrorCode::new(206);
pub const PQL0207: ErrorCode = ErrorCode::new(207);

// Internal errors
pub const PQL0400: ErrorCode = ErrorCode::new(400);
pub const PQL0401: ErrorCode = ErrorCode::new(401);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(PQL0001.to_string(), "PQL0001");
        assert_eq!(PQL0200.to_string(), "PQL0200");
    }

    #[test]
    fn test_error_categories() {
        assert!(PQL0001.is_structural_error());
        assert!(!PQL0001.is_scope_error());

        assert!(PQL0100.is_scope_error());
        assert!(PQL0207.is_type_error());
        assert!(PQL0400.is_internal_error());
    }

    #[test]
    fn test_error_info() {
        assert_eq!(PQL0003.info().description, "HAVING without GROUP BY");
        assert!(PQL0100.info().help.is_some());
        assert_eq!(ErrorCode::new(999).info().description, "Unknown error");
    }
}
