//! Static type inference
//!
//! The engine walks a normalized statement bottom-up and assigns every
//! expression a [`StaticType`]. Type checking problems never abort the walk:
//! the offending node gets a continuation type and the problem is
//! accumulated, so one run can surface several independent problems. Scope
//! problems (unbound, ambiguous or illegal global access) are fatal and end
//! the run with an error.
//!
//! Results are recorded in [`TypeAnnotations`], a side table keyed by node
//! identity.

mod annotations;
mod call;
mod expr;
mod query;

pub use annotations::TypeAnnotations;

use log::debug;
use pql_ast::{NodeId, NodeMeta, SourceLocation, Statement};
use pql_diagnostics::Result;

use crate::semantic::{
    BindingEnvironment, FunctionRegistry, InferenceOptions, Resolver, Scope, ScopeChain,
};
use crate::{Problem, ProblemDetail, StaticType};

/// Outcome of a successful inference run
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOutput {
    /// Type of the whole statement
    pub result_type: StaticType,
    /// Problems in discovery order
    pub problems: Vec<Problem>,
    pub annotations: TypeAnnotations,
}

impl InferenceOutput {
    /// Check whether any problem is an error
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(Problem::is_error)
    }
}

/// A query level being typed
#[derive(Debug)]
struct QueryLevel {
    /// FROM frame of a grouped query, set aside while the grouped frame is
    /// active
    from_scope: Option<Scope>,
}

/// Error-tolerant static type checker
pub struct StaticTypeInferencer<'a> {
    resolver: Resolver<'a>,
    functions: &'a FunctionRegistry,
    meta: &'a NodeMeta,
    chain: ScopeChain,
    levels: Vec<QueryLevel>,
    problems: Vec<Problem>,
    annotations: TypeAnnotations,
}

impl<'a> StaticTypeInferencer<'a> {
    pub fn new(
        globals: &'a BindingEnvironment,
        functions: &'a FunctionRegistry,
        options: &'a InferenceOptions,
        meta: &'a NodeMeta,
    ) -> Self {
        Self {
            resolver: Resolver::new(globals, options),
            functions,
            meta,
            chain: ScopeChain::new(),
            levels: Vec::new(),
            problems: Vec::new(),
            annotations: TypeAnnotations::new(),
        }
    }

    /// Type a statement
    pub fn infer(mut self, statement: &Statement) -> Result<InferenceOutput> {
        let result_type = match statement {
            Statement::Query(expr) => self.infer_expr(expr)?,
            Statement::Dml(dml) => self.infer_dml(dml)?,
        };
        debug!(
            "inferred {result_type} with {} problem(s)",
            self.problems.len()
        );
        Ok(InferenceOutput {
            result_type,
            problems: self.problems,
            annotations: self.annotations,
        })
    }

    fn report(&mut self, location: SourceLocation, detail: ProblemDetail) {
        self.problems.push(Problem::new(location, detail));
    }

    fn record(&mut self, node: NodeId, ty: StaticType) -> StaticType {
        self.annotations.set_type(node, ty.clone());
        ty
    }
}
