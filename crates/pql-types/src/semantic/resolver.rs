//! Identifier resolution
//!
//! Resolution order depends on where an identifier is written:
//! 1. In a FROM source position, unqualified names look at globals first
//! 2. Everywhere else, and for `@name`, lexical bindings come first
//!
//! A name found nowhere is unbound; a global matched by several catalog
//! entries is ambiguous. Both are fatal.

use log::trace;
use pql_ast::{Identifier, ScopeQualifier, VarRef};
use pql_diagnostics::{Result, SemanticError, SourceLocation};
use serde::{Deserialize, Serialize};

use super::scope::ScopeChain;
use super::symbols::{BindingEnvironment, GlobalLookup};
use crate::StaticType;

/// Restriction on access to global variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeConstraint {
    /// Globals may only be referenced as FROM sources
    PreventGlobalsExceptInFrom,
    /// Globals may not be referenced inside nested queries
    PreventGlobalsInNestedQueries,
}

/// Configuration of a type checking run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceOptions {
    pub constraints: Vec<ScopeConstraint>,
}

impl InferenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constraint(mut self, constraint: ScopeConstraint) -> Self {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
        self
    }

    pub fn has(&self, constraint: ScopeConstraint) -> bool {
        self.constraints.contains(&constraint)
    }
}

/// Where an identifier is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPosition {
    /// Root of a FROM source expression
    FromSource,
    /// Any other position
    Expression,
}

/// A resolved identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub ty: StaticType,
    /// `LocalsFirst` when a lexical binding was used, `Unqualified` for a global
    pub qualifier: ScopeQualifier,
}

/// Resolves identifiers against the scope chain and the global environment
pub struct Resolver<'a> {
    globals: &'a BindingEnvironment,
    options: &'a InferenceOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(globals: &'a BindingEnvironment, options: &'a InferenceOptions) -> Self {
        Self { globals, options }
    }

    /// Resolve a variable reference
    pub fn resolve(
        &self,
        chain: &ScopeChain,
        var: &VarRef,
        position: LookupPosition,
        location: SourceLocation,
    ) -> Result<Resolved> {
        let globals_first =
            position == LookupPosition::FromSource && var.qualifier == ScopeQualifier::Unqualified;

        let resolved = if globals_first {
            match self.global(chain, &var.name, position, location)? {
                Some(found) => Some(found),
                None => Self::local(chain, &var.name),
            }
        } else {
            match Self::local(chain, &var.name) {
                Some(found) => Some(found),
                None => self.global(chain, &var.name, position, location)?,
            }
        };

        resolved.ok_or_else(|| SemanticError::UnboundBinding {
            name: var.name.name.clone(),
            location,
        })
    }

    fn local(chain: &ScopeChain, name: &Identifier) -> Option<Resolved> {
        chain.lookup(name).map(|binding| {
            trace!("resolved {name} locally as {}", binding.ty);
            Resolved {
                ty: binding.ty.clone(),
                qualifier: ScopeQualifier::LocalsFirst,
            }
        })
    }

    fn global(
        &self,
        chain: &ScopeChain,
        name: &Identifier,
        position: LookupPosition,
        location: SourceLocation,
    ) -> Result<Option<Resolved>> {
        let ty = match self.globals.lookup(name) {
            GlobalLookup::NotFound => return Ok(None),
            GlobalLookup::Ambiguous => {
                return Err(SemanticError::AmbiguousBinding {
                    name: name.name.clone(),
                    location,
                });
            }
            GlobalLookup::Found(_, ty) => ty,
        };

        let outside_from = self.options.has(ScopeConstraint::PreventGlobalsExceptInFrom)
            && position != LookupPosition::FromSource;
        let nested = self.options.has(ScopeConstraint::PreventGlobalsInNestedQueries)
            && chain.query_depth() > 1;
        if outside_from || nested {
            return Err(SemanticError::IllegalGlobalVariableAccess {
                name: name.name.clone(),
                location,
            });
        }

        trace!("resolved {name} globally as {ty}");
        Ok(Some(Resolved {
            ty: ty.clone(),
            qualifier: ScopeQualifier::Unqualified,
        }))
    }
}
