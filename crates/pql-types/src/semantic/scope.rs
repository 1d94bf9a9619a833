//! Lexical scopes for query typing
//!
//! Each query level pushes a frame holding the names introduced by its FROM
//! and LET clauses. After grouping, the FROM frame is replaced by a frame
//! holding the GROUP BY keys and the GROUP AS binding. Lookups search frames
//! innermost to outermost.

use pql_ast::Identifier;
use pql_diagnostics::{Result, SemanticError, SourceLocation};
use std::fmt;

use crate::StaticType;

/// What introduced a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `FROM x AS a`
    FromAs,
    /// `FROM x AT a`
    FromAt,
    /// `FROM x BY a`
    FromBy,
    /// `LET x AS a`
    Let,
    /// `GROUP BY x AS a`, under its alias
    GroupKey,
    /// `GROUP BY x AS a`, under the key's unique name
    GroupKeyUniqueName,
    /// `GROUP AS a`
    GroupAs,
}

impl BindingKind {
    pub const fn is_from(&self) -> bool {
        matches!(self, Self::FromAs | Self::FromAt | Self::FromBy)
    }
}

/// A name bound in a scope
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// The name as written
    pub name: Identifier,
    pub ty: StaticType,
    pub kind: BindingKind,
}

/// Kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// FROM and LET bindings of a query level
    Query,
    /// Keys and group of a grouped query level
    Grouped,
    /// FROM bindings of a DML statement
    Dml,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Grouped => write!(f, "grouped"),
            Self::Dml => write!(f, "dml"),
        }
    }
}

/// A single frame
#[derive(Debug, Clone)]
pub struct Scope {
    kind: ScopeKind,
    /// In definition order
    bindings: Vec<Binding>,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            bindings: Vec::new(),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Define a FROM binding
    ///
    /// A name that collides with one already bound in this frame is
    /// ambiguous. Quoted names differing only in case do not collide.
    pub fn define_unique(&mut self, binding: Binding, location: SourceLocation) -> Result<()> {
        if self.bindings.iter().any(|b| b.name.collides_with(&binding.name)) {
            return Err(SemanticError::AmbiguousBinding {
                name: binding.name.name,
                location,
            });
        }
        self.bindings.push(binding);
        Ok(())
    }

    /// Define a binding, shadowing any colliding binding
    pub fn define(&mut self, binding: Binding) {
        self.bindings.retain(|b| !b.name.collides_with(&binding.name));
        self.bindings.push(binding);
    }

    /// Look up a name in this frame only
    ///
    /// A binding spelled exactly like the name wins over one that only
    /// matches ignoring case.
    pub fn lookup_local(&self, name: &Identifier) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|b| b.name.name == name.name)
            .or_else(|| self.bindings.iter().find(|b| name.matches(&b.name.name)))
    }

    /// Bindings in definition order
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }
}

/// Stack of frames for the query being typed
#[derive(Debug, Clone, Default)]
pub struct ScopeChain {
    frames: Vec<Scope>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new empty frame
    pub fn enter(&mut self, kind: ScopeKind) {
        self.frames.push(Scope::new(kind));
    }

    /// Push an already built frame
    pub fn push(&mut self, scope: Scope) {
        self.frames.push(scope);
    }

    /// Leave the innermost frame
    pub fn leave(&mut self) -> Option<Scope> {
        self.frames.pop()
    }

    /// The innermost frame
    pub fn current(&self) -> Option<&Scope> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Scope> {
        self.frames.last_mut()
    }

    /// Look up a name, innermost frame first
    pub fn lookup(&self, name: &Identifier) -> Option<&Binding> {
        self.frames
            .iter()
            .rev()
            .find_map(|scope| scope.lookup_local(name))
    }

    /// Number of enclosing query levels
    pub fn query_depth(&self) -> usize {
        self.frames
            .iter()
            .filter(|s| matches!(s.kind, ScopeKind::Query | ScopeKind::Grouped))
            .count()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Run `f` inside a temporary frame
    pub fn with_scope<F, R>(&mut self, kind: ScopeKind, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.enter(kind);
        let result = f(self);
        self.leave();
        result
    }
}
