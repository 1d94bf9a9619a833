//! Explicit aliases for select list items

use log::{debug, trace};
use pql_ast::{Fold, NodeMeta, ProjectItem, Projection, Select, Statement, fold_select_children};
use pql_diagnostics::Result;

use crate::{NormalizationPass, synthesize_alias};

/// Gives every `expr` item of a select list an alias
///
/// Positions count every item of the list, `x.*` items included.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectListItemAlias;

impl NormalizationPass for SelectListItemAlias {
    fn name(&self) -> &'static str {
        "SelectListItemAlias"
    }

    fn apply(&self, statement: Statement, _meta: &mut NodeMeta) -> Result<Statement> {
        debug!("running {}", self.name());
        ItemAliaser.fold_statement(statement)
    }
}

struct ItemAliaser;

impl Fold for ItemAliaser {
    fn fold_select(&mut self, select: Select) -> Result<Select> {
        let select = fold_select_children(self, select)?;
        let projection = match select.projection {
            Projection::List(items) => Projection::List(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| alias_item(item, index + 1))
                    .collect(),
            ),
            other => other,
        };
        Ok(Select {
            projection,
            ..select
        })
    }
}

fn alias_item(item: ProjectItem, position: usize) -> ProjectItem {
    match item {
        ProjectItem::Expr { expr, alias: None } => {
            let alias = synthesize_alias(&expr, position);
            trace!("select item {expr} aliased as {alias}");
            ProjectItem::Expr {
                expr,
                alias: Some(alias),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pql_ast::{BinaryOp, Expr, FromItem, FromSource, Identifier};
    use pretty_assertions::assert_eq;

    fn run(select: Select) -> Statement {
        SelectListItemAlias
            .apply(Statement::query(Expr::select(select)), &mut NodeMeta::new())
            .unwrap()
    }

    #[test]
    fn test_items_are_aliased_by_shape_and_position() {
        let select = Select::items(vec![
            ProjectItem::expr(Expr::id("a")),
            ProjectItem::all(Expr::id("t")),
            ProjectItem::expr(Expr::binary(Expr::int(1), BinaryOp::Add, Expr::int(2))),
            ProjectItem::expr(Expr::dot(Expr::id("t"), "Name")),
            ProjectItem::aliased(Expr::int(5), "five"),
        ])
        .from(FromSource::scan(FromItem::new(Expr::id("t")).alias("t")));

        let out = run(select);
        assert_eq!(
            out.to_string(),
            "SELECT a AS a, t.*, 1 + 2 AS _3, t.Name AS Name, 5 AS five FROM t AS t"
        );
    }

    #[test]
    fn test_nested_lists_number_independently() {
        let inner = Select::items(vec![ProjectItem::expr(Expr::int(0))]);
        let outer = Select::items(vec![
            ProjectItem::expr(Expr::int(1)),
            ProjectItem::expr(Expr::select(inner)),
        ]);

        let out = run(outer);
        assert_eq!(out.to_string(), "SELECT 1 AS _1, (SELECT 0 AS _1) AS _2");
    }

    #[test]
    fn test_group_key_reference_keeps_surface_name() {
        let select = Select::items(vec![ProjectItem::expr(Expr::group_key_ref(
            "$__partiql__group_by_0_item_0",
            Identifier::quoted("Key"),
        ))]);
        let out = run(select);
        let projection = &out.as_query().and_then(Expr::as_select).unwrap().projection;
        let Projection::List(items) = projection else {
            panic!("expected a select list");
        };
        assert_eq!(items[0].alias(), Some(&Identifier::quoted("Key")));
    }

    #[test]
    fn test_is_idempotent() {
        let once = run(Select::items(vec![ProjectItem::expr(Expr::int(1))]));
        let twice = SelectListItemAlias
            .apply(once.clone(), &mut NodeMeta::new())
            .unwrap();
        assert_eq!(once, twice);
    }
}
