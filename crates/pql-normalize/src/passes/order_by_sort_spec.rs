//! Resolution of ORDER BY keys naming select list aliases

use log::{debug, trace};
use pql_ast::{
    ExprKind, Fold, NodeMeta, ProjectItem, Projection, Select, SortSpec, Statement,
    fold_select_children,
};
use pql_diagnostics::Result;

use crate::NormalizationPass;

/// Substitutes ORDER BY keys that name a select list alias with the aliased
/// expression
///
/// Both sides must agree on case sensitivity: a quoted key only matches a
/// quoted alias, and an unquoted key only an unquoted one. Keys that match
/// nothing are left for scope lookup. The substituted expression keeps the
/// identities of the select list item it copies.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderBySortSpec;

impl NormalizationPass for OrderBySortSpec {
    fn name(&self) -> &'static str {
        "OrderBySortSpec"
    }

    fn apply(&self, statement: Statement, _meta: &mut NodeMeta) -> Result<Statement> {
        debug!("running {}", self.name());
        SortKeyResolver.fold_statement(statement)
    }
}

struct SortKeyResolver;

impl Fold for SortKeyResolver {
    fn fold_select(&mut self, select: Select) -> Result<Select> {
        let mut select = fold_select_children(self, select)?;
        if let Projection::List(items) = &select.projection {
            let order_by = std::mem::take(&mut select.order_by);
            select.order_by = order_by
                .into_iter()
                .map(|spec| resolve(spec, items))
                .collect();
        }
        Ok(select)
    }
}

fn resolve(spec: SortSpec, items: &[ProjectItem]) -> SortSpec {
    // already substituted
    if items.iter().any(|item| item.expression().id == spec.expr.id) {
        return spec;
    }
    let ExprKind::Id(var) = &spec.expr.kind else {
        return spec;
    };
    let target = items.iter().find_map(|item| match item {
        ProjectItem::Expr {
            expr,
            alias: Some(alias),
        } if alias.same_as(&var.name) => Some(expr),
        _ => None,
    });
    match target {
        Some(expr) => {
            trace!("ORDER BY {} resolved to {expr}", var.name);
            SortSpec {
                expr: expr.clone(),
                ..spec
            }
        }
        None => spec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pql_ast::{BinaryOp, Expr, FromItem, FromSource, Identifier};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn run(statement: Statement) -> Statement {
        OrderBySortSpec
            .apply(statement, &mut NodeMeta::new())
            .unwrap()
    }

    fn ordered(alias: Identifier, key: Expr) -> Statement {
        let select = Select::items(vec![ProjectItem::aliased(
            Expr::binary(Expr::id("a"), BinaryOp::Add, Expr::int(1)),
            alias,
        )])
        .from(FromSource::scan(FromItem::new(Expr::id("t")).alias("t")))
        .order_by(SortSpec::new(key).desc());
        Statement::query(Expr::select(select))
    }

    #[rstest]
    #[case(Identifier::new("x"), Expr::id("X"), "a + 1 DESC")]
    #[case(Identifier::quoted("x"), Expr::quoted_id("x"), "a + 1 DESC")]
    #[case(Identifier::quoted("x"), Expr::id("x"), "x DESC")]
    #[case(Identifier::new("x"), Expr::quoted_id("x"), "\"x\" DESC")]
    #[case(Identifier::new("x"), Expr::id("y"), "y DESC")]
    fn test_sort_key_substitution(
        #[case] alias: Identifier,
        #[case] key: Expr,
        #[case] expected: &str,
    ) {
        let out = run(ordered(alias, key));
        let select = out.as_query().and_then(Expr::as_select).unwrap();
        assert_eq!(select.order_by[0].to_string(), expected);
    }

    #[test]
    fn test_swapped_aliases_are_idempotent() {
        let select = Select::items(vec![
            ProjectItem::aliased(Expr::id("a"), "b"),
            ProjectItem::aliased(Expr::id("b"), "a"),
        ])
        .order_by(SortSpec::new(Expr::id("b")));
        let once = run(Statement::query(Expr::select(select)));
        let twice = run(once.clone());
        assert_eq!(once, twice);
        assert!(once.to_string().ends_with("ORDER BY a"));
    }

    #[test]
    fn test_each_level_uses_its_own_aliases() {
        let inner = Select::items(vec![ProjectItem::aliased(Expr::id("b"), "x")])
            .from(FromSource::scan(FromItem::new(Expr::id("u")).alias("u")))
            .order_by(SortSpec::new(Expr::id("x")))
            .order_by(SortSpec::new(Expr::id("y")));
        let outer = Select::items(vec![
            ProjectItem::aliased(Expr::id("a"), "y"),
            ProjectItem::aliased(Expr::select(inner), "sub"),
        ])
        .from(FromSource::scan(FromItem::new(Expr::id("t")).alias("t")))
        .order_by(SortSpec::new(Expr::id("x")))
        .order_by(SortSpec::new(Expr::id("y")));

        let out = run(Statement::query(Expr::select(outer)));
        let outer = out.as_query().and_then(Expr::as_select).unwrap();
        let keys: Vec<String> = outer.order_by.iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["x", "a"]);

        let Projection::List(items) = &outer.projection else {
            panic!("expected a select list");
        };
        let inner = items[1].expression().as_select().unwrap();
        let keys: Vec<String> = inner.order_by.iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["b", "y"]);
    }
}
