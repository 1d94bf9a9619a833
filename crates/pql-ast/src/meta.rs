//! Metadata side tables written by normalization passes
//!
//! Tree nodes are immutable values; information that passes attach to nodes
//! (unique names of GROUP BY keys, aggregate call sites of a query level) is
//! kept here, keyed by [`NodeId`].

use crate::NodeId;
use indexmap::IndexMap;

/// Unique name of the `index`-th GROUP BY key of a query at nesting `depth`
pub fn group_key_unique_name(depth: usize, index: usize) -> String {
    format!("$__partiql__group_by_{depth}_item_{index}")
}

/// A registered aggregate call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Sequential id within the query level, from 0
    pub id: usize,
    /// Aggregate function name, lowercased
    pub name: String,
    /// Identity of the aggregate call expression
    pub node: NodeId,
}

/// Aggregate call sites of one query level, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateRegistry {
    call_sites: Vec<CallSite>,
}

impl AggregateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call site and return its id
    pub fn register(&mut self, name: &str, node: NodeId) -> usize {
        let id = self.call_sites.len();
        self.call_sites.push(CallSite {
            id,
            name: name.to_ascii_lowercase(),
            node,
        });
        id
    }

    pub fn call_sites(&self) -> &[CallSite] {
        &self.call_sites
    }

    /// Look up the call site registered for an aggregate node
    pub fn get(&self, node: NodeId) -> Option<&CallSite> {
        self.call_sites.iter().find(|site| site.node == node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    pub fn len(&self) -> usize {
        self.call_sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.call_sites.is_empty()
    }

    /// `(name, id)` pairs in registration order
    pub fn summary(&self) -> Vec<(String, usize)> {
        self.call_sites
            .iter()
            .map(|site| (site.name.clone(), site.id))
            .collect()
    }
}

/// Side tables attached to a statement by normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMeta {
    unique_names: IndexMap<NodeId, String>,
    aggregates: IndexMap<NodeId, AggregateRegistry>,
}

impl NodeMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a unique name to a GROUP BY key
    pub fn set_unique_name(&mut self, key: NodeId, name: impl Into<String>) {
        self.unique_names.insert(key, name.into());
    }

    /// Unique name of a GROUP BY key
    pub fn unique_name(&self, key: NodeId) -> Option<&str> {
        self.unique_names.get(&key).map(String::as_str)
    }

    /// Replace the aggregate registry of a query level
    pub fn set_aggregates(&mut self, select: NodeId, registry: AggregateRegistry) {
        self.aggregates.insert(select, registry);
    }

    /// Aggregate registry of a query level, keyed by the SELECT expression
    pub fn aggregates(&self, select: NodeId) -> Option<&AggregateRegistry> {
        self.aggregates.get(&select)
    }

    /// Number of query levels with an aggregate registry
    pub fn query_levels(&self) -> usize {
        self.aggregates.len()
    }
}
