//! PQL diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by the
//! normalization pipeline and the static type checker, including error codes,
//! source locations, fatal semantic errors and diagnostic rendering.

mod error;
mod error_code;
mod location;

pub use error::*;
pub use error_code::*;
pub use location::*;

/// Result type for operations that can fail fatally
pub type Result<T> = std::result::Result<T, SemanticError>;
