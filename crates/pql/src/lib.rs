//! Static analysis of PartiQL-style queries
//!
//! This crate ties the front-end together:
//! - structural validation of a parsed statement
//! - normalization into canonical form
//! - static type inference with error-tolerant problem reporting
//!
//! # Example
//!
//! ```
//! use pql::{SemanticOptions, StaticAnalyzer};
//! use pql::ast::{Expr, FromItem, FromSource, Select, Statement};
//! use pql::types::StaticType;
//!
//! let options = SemanticOptions::new()
//!     .with_global("foo", StaticType::bag(StaticType::closed_struct([("a", StaticType::int4())])));
//! let select = Select::star().from(FromSource::scan(FromItem::new(Expr::id("foo")).alias("f")));
//!
//! let outcome = StaticAnalyzer::new(options)
//!     .analyze(Statement::query(Expr::select(select)))
//!     .unwrap();
//! assert_eq!(outcome.statement.to_string(), "SELECT \"f\".* FROM foo AS f");
//! assert!(outcome.status().is_success());
//! ```

mod analyzer;
mod options;

pub use pql_ast as ast;
pub use pql_diagnostics as diagnostics;
pub use pql_normalize as normalize;
pub use pql_types as types;

pub use analyzer::{AnalysisOutcome, AnalysisStatus, StaticAnalyzer};
pub use options::SemanticOptions;
pub use pql_diagnostics::{Result, SemanticError};
pub use pql_types::{Problem, ProblemDetail, StaticType};
