//! Type names used by `CAST` and `IS`

use serde::{Deserialize, Serialize};

/// A type name as written in the query text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    Null,
    Missing,
    Any,
    Boolean,
    SmallInt,
    Integer4,
    Integer8,
    Integer,
    Float,
    Real,
    DoublePrecision,
    /// `DECIMAL[(precision[, scale])]`
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    /// `CHAR[(n)]`, a fixed-length string
    Character { length: Option<u32> },
    /// `VARCHAR[(n)]` or `STRING`
    CharacterVarying { length: Option<u32> },
    String,
    Symbol,
    Timestamp,
    Blob,
    Clob,
    Struct,
    Tuple,
    List,
    Bag,
    Sexp,
}

impl TypeName {
    /// Get the type name as written in queries
    pub fn sql_name(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Missing => "MISSING".to_string(),
            Self::Any => "ANY".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::SmallInt => "SMALLINT".to_string(),
            Self::Integer4 => "INT4".to_string(),
            Self::Integer8 => "INT8".to_string(),
            Self::Integer => "INT".to_string(),
            Self::Float => "FLOAT".to_string(),
            Self::Real => "REAL".to_string(),
            Self::DoublePrecision => "DOUBLE PRECISION".to_string(),
            Self::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p}, {s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => "DECIMAL".to_string(),
            },
            Self::Character { length } => match length {
                Some(n) => format!("CHAR({n})"),
                None => "CHAR".to_string(),
            },
            Self::CharacterVarying { length } => match length {
                Some(n) => format!("VARCHAR({n})"),
                None => "VARCHAR".to_string(),
            },
            Self::String => "STRING".to_string(),
            Self::Symbol => "SYMBOL".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
            Self::Blob => "BLOB".to_string(),
            Self::Clob => "CLOB".to_string(),
            Self::Struct => "STRUCT".to_string(),
            Self::Tuple => "TUPLE".to_string(),
            Self::List => "LIST".to_string(),
            Self::Bag => "BAG".to_string(),
            Self::Sexp => "SEXP".to_string(),
        }
    }
}
