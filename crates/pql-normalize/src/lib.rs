//! PQL normalization
//!
//! This crate rewrites a parsed statement into the canonical shape the type
//! checker expects:
//! - the sanity validator, which rejects unsupported structures up front
//! - seven rewriting passes, each idempotent
//! - the pipeline that runs the passes in their fixed order
//!
//! Passes consume and return the statement and record what they learn about
//! nodes (GROUP BY key unique names, aggregate call sites) in [`NodeMeta`].
//!
//! [`NodeMeta`]: pql_ast::NodeMeta

mod pass;
pub mod passes;
mod pipeline;
mod validator;

pub use pass::*;
pub use passes::*;
pub use pipeline::*;
pub use validator::*;
