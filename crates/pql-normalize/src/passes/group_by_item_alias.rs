//! Aliases and unique names for GROUP BY keys

use log::{debug, trace};
use pql_ast::{
    Fold, GroupBy, GroupKey, NodeMeta, Select, Statement, fold_select_children,
    group_key_unique_name,
};
use pql_diagnostics::Result;

use crate::{NormalizationPass, synthesize_alias};

/// Gives every GROUP BY key an alias and a unique name
///
/// The unique name encodes the nesting depth of the query (0 for the
/// outermost) and the 0-based position of the key, so keys of different
/// query levels never collide.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupByItemAlias;

impl NormalizationPass for GroupByItemAlias {
    fn name(&self) -> &'static str {
        "GroupByItemAlias"
    }

    fn apply(&self, statement: Statement, meta: &mut NodeMeta) -> Result<Statement> {
        debug!("running {}", self.name());
        KeyAliaser { meta, depth: 0 }.fold_statement(statement)
    }
}

struct KeyAliaser<'m> {
    meta: &'m mut NodeMeta,
    depth: usize,
}

impl KeyAliaser<'_> {
    fn alias_keys(&mut self, group_by: GroupBy, depth: usize) -> GroupBy {
        let keys = group_by
            .keys
            .into_iter()
            .enumerate()
            .map(|(index, key)| {
                let unique = group_key_unique_name(depth, index);
                trace!("GROUP BY key {} is {unique}", key.expr);
                self.meta.set_unique_name(key.id, unique);
                match key.alias {
                    Some(_) => key,
                    None => GroupKey {
                        alias: Some(synthesize_alias(&key.expr, index + 1)),
                        ..key
                    },
                }
            })
            .collect();
        GroupBy { keys, ..group_by }
    }
}

impl Fold for KeyAliaser<'_> {
    fn fold_select(&mut self, select: Select) -> Result<Select> {
        let depth = self.depth;
        self.depth += 1;
        let folded = fold_select_children(self, select);
        self.depth = depth;

        let mut select = folded?;
        select.group_by = select.group_by.map(|g| self.alias_keys(g, depth));
        Ok(select)
    }
}
