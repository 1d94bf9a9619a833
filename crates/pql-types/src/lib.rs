//! PQL static types
//!
//! This crate defines the static type system and the type checker:
//! - the `StaticType` lattice (unions, widening, comparability)
//! - global bindings, function signatures and lexical scopes
//! - the error-tolerant type inference engine and its problems

pub mod inference;
pub mod problem;
pub mod semantic;
pub mod static_type;

pub use inference::*;
pub use problem::*;
pub use semantic::*;
pub use static_type::*;
