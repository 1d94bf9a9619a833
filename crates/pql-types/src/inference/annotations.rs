//! Per-node results of type inference

use indexmap::IndexMap;
use pql_ast::{NodeId, ScopeQualifier};

use crate::StaticType;

/// Types and resolution qualifiers recorded during inference
///
/// Every typed expression gets an entry in the type table. Identifiers
/// additionally record the qualifier their resolution actually used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeAnnotations {
    types: IndexMap<NodeId, StaticType>,
    qualifiers: IndexMap<NodeId, ScopeQualifier>,
}

impl TypeAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_type(&mut self, node: NodeId, ty: StaticType) {
        self.types.insert(node, ty);
    }

    pub fn set_qualifier(&mut self, node: NodeId, qualifier: ScopeQualifier) {
        self.qualifiers.insert(node, qualifier);
    }

    /// Resolved type of a node
    pub fn type_of(&self, node: NodeId) -> Option<&StaticType> {
        self.types.get(&node)
    }

    /// Qualifier used to resolve an identifier
    pub fn qualifier_of(&self, node: NodeId) -> Option<ScopeQualifier> {
        self.qualifiers.get(&node).copied()
    }

    /// Number of typed nodes
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
