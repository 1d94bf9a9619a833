//! Top-level statements

use crate::{BoxExpr, Expr, FromSource, SourceLocation};

/// A statement handed to the semantic front-end
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A query expression (usually a SELECT)
    Query(Expr),
    /// A data manipulation statement
    Dml(DmlStatement),
}

impl Statement {
    /// Wrap a query expression
    pub fn query(expr: Expr) -> Self {
        Self::Query(expr)
    }

    /// Location of the statement
    pub fn location(&self) -> SourceLocation {
        match self {
            Self::Query(expr) => expr.location,
            Self::Dml(dml) => dml.location,
        }
    }

    /// Get the query expression if this is a query
    pub fn as_query(&self) -> Option<&Expr> {
        match self {
            Self::Query(expr) => Some(expr),
            Self::Dml(_) => None,
        }
    }
}

/// `[FROM ...] [WHERE ...] <operations>`
#[derive(Debug, Clone, PartialEq)]
pub struct DmlStatement {
    pub from: Option<FromSource>,
    pub where_clause: Option<BoxExpr>,
    pub operations: Vec<DmlOp>,
    pub location: SourceLocation,
}

impl DmlStatement {
    pub fn new(operations: Vec<DmlOp>) -> Self {
        Self {
            from: None,
            where_clause: None,
            operations,
            location: SourceLocation::default(),
        }
    }

    pub fn from(mut self, from: FromSource) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_where(mut self, predicate: Expr) -> Self {
        self.where_clause = Some(Box::new(predicate));
        self
    }
}

/// A data manipulation operation
#[derive(Debug, Clone, PartialEq)]
pub enum DmlOp {
    /// `INSERT INTO target VALUES values`
    Insert { target: Expr, values: Expr },
    /// `SET target = value, ...`
    Set(Vec<Assignment>),
    /// `REMOVE target`
    Remove(Expr),
    /// `DELETE`
    Delete,
}

/// `target = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Expr,
    pub value: Expr,
}
