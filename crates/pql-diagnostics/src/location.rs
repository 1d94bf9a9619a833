//! Source locations carried by query tree nodes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node in the query text
///
/// Every node of a query tree carries one. Nodes synthesized by the
/// normalization passes copy the location of the node they derive from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// Length in characters
    pub length: usize,
}

impl SourceLocation {
    pub const fn new(line: usize, column: usize, length: usize) -> Self {
        Self {
            line,
            column,
            length,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SourceLocation::default(), "1:1")]
    #[case(SourceLocation::new(3, 14, 5), "3:14")]
    fn test_display_omits_length(#[case] location: SourceLocation, #[case] expected: &str) {
        assert_eq!(location.to_string(), expected);
    }

    #[test]
    fn test_serialized_fields() {
        let json = serde_json::to_value(SourceLocation::new(2, 7, 3)).unwrap();
        assert_eq!(json, serde_json::json!({"line": 2, "column": 7, "length": 3}));
    }
}
