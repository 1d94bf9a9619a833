//! Semantic analysis support
//!
//! This module provides:
//! - the global binding environment and function signatures
//! - lexical scope frames for query levels
//! - identifier resolution with configurable constraints

mod resolver;
mod scope;
mod symbols;

pub use resolver::*;
pub use scope::*;
pub use symbols::*;
