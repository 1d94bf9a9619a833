//! Literal tree nodes

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// `NULL`
    Null,
    /// `MISSING`
    Missing,
    /// Boolean literal (true/false)
    Boolean(bool),
    /// Integer literal
    ///
    /// Held wider than the representable range so that the sanity validator
    /// can reject overflowing literals instead of the parser truncating them.
    Integer(i128),
    /// Exact decimal literal
    Decimal(Decimal),
    /// Approximate numeric literal
    Float(f64),
    /// String literal
    String(String),
    /// Symbol literal
    Symbol(String),
    /// Timestamp literal
    Timestamp(DateTime<FixedOffset>),
    /// Binary large object
    Blob(Vec<u8>),
    /// Character large object
    Clob(Vec<u8>),
}

impl Literal {
    /// Check whether this is a text literal (string or symbol)
    pub fn is_text(&self) -> bool {
        matches!(self, Self::String(_) | Self::Symbol(_))
    }

    /// Get the text of a string or symbol literal
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Check whether an integer literal fits a signed 64-bit integer
    pub fn is_representable(&self) -> bool {
        match self {
            Self::Integer(v) => i64::try_from(*v).is_ok(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_literals() {
        assert_eq!(Literal::String("a".into()).as_text(), Some("a"));
        assert_eq!(Literal::Symbol("b".into()).as_text(), Some("b"));
        assert!(Literal::Integer(1).as_text().is_none());
    }

    #[test]
    fn test_integer_range() {
        assert!(Literal::Integer(i64::MAX as i128).is_representable());
        assert!(!Literal::Integer(i64::MAX as i128 + 1).is_representable());
        assert!(!Literal::Integer(i64::MIN as i128 - 1).is_representable());
    }
}
