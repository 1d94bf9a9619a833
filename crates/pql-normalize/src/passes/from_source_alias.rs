//! Explicit `AS` aliases for FROM items

use log::{debug, trace};
use pql_ast::{
    DmlStatement, Fold, FromItem, FromSource, Join, NodeMeta, Select, Statement,
    fold_select_children, fold_statement_children,
};
use pql_diagnostics::Result;

use crate::{NormalizationPass, synthesize_alias};

/// Gives every FROM item without an `AS` alias a synthesized one
///
/// Positions count every item of one FROM clause, across commas and joins,
/// whether or not the item needed an alias. Each query restarts the count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromSourceAlias;

impl NormalizationPass for FromSourceAlias {
    fn name(&self) -> &'static str {
        "FromSourceAlias"
    }

    fn apply(&self, statement: Statement, _meta: &mut NodeMeta) -> Result<Statement> {
        debug!("running {}", self.name());
        AliasFolder.fold_statement(statement)
    }
}

struct AliasFolder;

impl Fold for AliasFolder {
    fn fold_statement(&mut self, stmt: Statement) -> Result<Statement> {
        Ok(match fold_statement_children(self, stmt)? {
            Statement::Dml(dml) => Statement::Dml(DmlStatement {
                from: dml.from.map(alias_clause),
                ..dml
            }),
            query => query,
        })
    }

    fn fold_select(&mut self, select: Select) -> Result<Select> {
        let select = fold_select_children(self, select)?;
        Ok(Select {
            from: select.from.map(alias_clause),
            ..select
        })
    }
}

fn alias_clause(source: FromSource) -> FromSource {
    let mut position = 0;
    alias_source(source, &mut position)
}

fn alias_source(source: FromSource, position: &mut usize) -> FromSource {
    match source {
        FromSource::Scan(item) => FromSource::Scan(alias_item(item, position)),
        FromSource::Unpivot(item) => FromSource::Unpivot(alias_item(item, position)),
        FromSource::Join(join) => {
            let Join {
                kind,
                left,
                right,
                predicate,
            } = *join;
            let left = alias_source(left, position);
            let right = alias_source(right, position);
            FromSource::Join(Box::new(Join {
                kind,
                left,
                right,
                predicate,
            }))
        }
    }
}

fn alias_item(item: FromItem, position: &mut usize) -> FromItem {
    *position += 1;
    if item.as_alias.is_some() {
        return item;
    }
    let alias = synthesize_alias(&item.expr, *position);
    trace!("FROM item {} aliased as {alias}", item.expr);
    FromItem {
        as_alias: Some(alias),
        ..item
    }
}
