//! PQL query tree definitions
//!
//! This crate defines the tree produced by the (external) parser and consumed
//! by the normalization pipeline and the static type checker:
//! - expression, query, FROM-source, projection and DML nodes
//! - stable node identities and side tables for metadata attached by passes
//! - `Fold` and `Visitor` traversal traits shared by every pass

mod display;
mod expression;
mod fold;
mod literal;
mod meta;
mod operator;
mod query;
mod statement;
mod types;
mod visit;

pub use expression::*;
pub use fold::*;
pub use literal::*;
pub use meta::*;
pub use operator::*;
pub use query::*;
pub use statement::*;
pub use types::*;
pub use visit::*;

pub use pql_diagnostics::SourceLocation;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Type alias for boxed expressions
pub type BoxExpr = Box<Expr>;

/// Stable identity of a tree node
///
/// Identities are allocated from a process-wide counter when a node is
/// constructed. Passes keep the identity of every node they keep and only
/// allocate new identities for nodes they synthesize, so side tables keyed by
/// `NodeId` survive rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    /// Allocate a fresh identity
    pub fn fresh() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An identifier, case-insensitive unless it was quoted
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// The identifier text
    pub name: String,
    /// Whether this is a quoted (case-sensitive) identifier
    pub quoted: bool,
}

impl Identifier {
    /// Create a new (case-insensitive) identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: false,
        }
    }

    /// Create a quoted (case-sensitive) identifier
    pub fn quoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: true,
        }
    }

    /// Check whether `text` is matched by this identifier
    ///
    /// Quoted identifiers match exactly, others ignore ASCII case.
    pub fn matches(&self, text: &str) -> bool {
        if self.quoted {
            self.name == text
        } else {
            self.name.eq_ignore_ascii_case(text)
        }
    }

    /// Check whether two identifiers denote the same name
    ///
    /// Both sides must agree on case sensitivity; quoted names then compare
    /// exactly and unquoted names compare ignoring case.
    pub fn same_as(&self, other: &Identifier) -> bool {
        self.quoted == other.quoted && self.matches(&other.name)
    }

    /// Check whether two names clash when bound in the same frame
    ///
    /// Two quoted names clash only when equal; a pair involving an unquoted
    /// name clashes when equal ignoring ASCII case.
    pub fn collides_with(&self, other: &Identifier) -> bool {
        if self.quoted && other.quoted {
            self.name == other.name
        } else {
            self.name.eq_ignore_ascii_case(&other.name)
        }
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// How an identifier is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScopeQualifier {
    /// No qualifier: default lookup order for the position
    #[default]
    Unqualified,
    /// `@name`: lexical bindings are searched before globals
    LocalsFirst,
}
