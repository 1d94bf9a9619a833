//! Aggregate call site registration

use log::{debug, trace};
use pql_ast::{
    AggregateRegistry, Expr, ExprKind, Fold, NodeMeta, ProjectItem, Projection, Select,
    Statement, Visitor, fold_expr_children, walk_expr,
};
use pql_diagnostics::Result;

use crate::NormalizationPass;

/// Registers the aggregate calls of every query level
///
/// Each SELECT gets its own registry, keyed by the SELECT expression, with
/// call site ids from 0 in visiting order: HAVING first, then the select
/// list. WHERE, `SELECT VALUE` and nested queries contribute nothing to the
/// level. Registries are rebuilt on every run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateSupport;

impl NormalizationPass for AggregateSupport {
    fn name(&self) -> &'static str {
        "AggregateSupport"
    }

    fn apply(&self, statement: Statement, meta: &mut NodeMeta) -> Result<Statement> {
        debug!("running {}", self.name());
        Registrar { meta }.fold_statement(statement)
    }
}

struct Registrar<'m> {
    meta: &'m mut NodeMeta,
}

impl Fold for Registrar<'_> {
    fn fold_expr(&mut self, expr: Expr) -> Result<Expr> {
        let expr = fold_expr_children(self, expr)?;
        if let ExprKind::Select(select) = &expr.kind {
            let registry = collect_call_sites(select)?;
            trace!(
                "query {} has {} aggregate call site(s)",
                expr.id,
                registry.len()
            );
            self.meta.set_aggregates(expr.id, registry);
        }
        Ok(expr)
    }
}

fn collect_call_sites(select: &Select) -> Result<AggregateRegistry> {
    let mut collector = CallSiteCollector::default();
    if let Some(having) = &select.having {
        collector.visit_expr(having)?;
    }
    if let Projection::List(items) = &select.projection {
        for item in items {
            match item {
                ProjectItem::All { expr } | ProjectItem::Expr { expr, .. } => {
                    collector.visit_expr(expr)?;
                }
            }
        }
    }
    Ok(collector.registry)
}

/// Collects the aggregates of one query level
#[derive(Default)]
struct CallSiteCollector {
    registry: AggregateRegistry,
}

impl Visitor for CallSiteCollector {
    fn visit_expr(&mut self, expr: &Expr) -> Result<()> {
        match &expr.kind {
            ExprKind::CallAgg(agg) => {
                self.registry.register(&agg.name, expr.id);
                Ok(())
            }
            ExprKind::Select(_) => Ok(()),
            _ => walk_expr(self, expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pql_ast::{BinaryOp, CallSite, FromItem, FromSource, GroupBy, GroupKey, SetQuantifier};
    use pretty_assertions::assert_eq;

    fn count(arg: Expr) -> Expr {
        Expr::agg("count", SetQuantifier::All, Some(arg))
    }

    fn sum(arg: Expr) -> Expr {
        Expr::agg("SUM", SetQuantifier::All, Some(arg))
    }

    fn grouped(select: Select) -> Select {
        select
            .from(FromSource::scan(FromItem::new(Expr::id("foo")).alias("foo")))
            .group_by(GroupBy::new(vec![GroupKey::aliased(Expr::id("bar"), "bar")]))
    }

    #[test]
    fn test_having_is_registered_before_projection() {
        let select = grouped(Select::items(vec![ProjectItem::expr(count(Expr::int(1)))]))
            .having(Expr::binary(sum(Expr::int(1)), BinaryOp::Gt, Expr::int(0)));
        let query = Expr::select(select);
        let id = query.id;

        let mut meta = NodeMeta::new();
        AggregateSupport
            .apply(Statement::query(query), &mut meta)
            .unwrap();
        assert_eq!(
            meta.aggregates(id).unwrap().summary(),
            vec![("sum".to_string(), 0), ("count".to_string(), 1)]
        );
    }

    #[test]
    fn test_select_value_and_where_contribute_nothing() {
        let select = grouped(Select::value(sum(Expr::id("x"))))
            .with_where(Expr::binary(count(Expr::id("y")), BinaryOp::Gt, Expr::int(1)));
        let query = Expr::select(select);
        let id = query.id;

        let mut meta = NodeMeta::new();
        AggregateSupport
            .apply(Statement::query(query), &mut meta)
            .unwrap();
        assert!(meta.aggregates(id).is_some_and(AggregateRegistry::is_empty));
    }

    #[test]
    fn test_nested_queries_have_their_own_registry() {
        let inner_agg = sum(Expr::id("v"));
        let inner_agg_id = inner_agg.id;
        let inner = Expr::select(
            Select::items(vec![ProjectItem::expr(inner_agg)])
                .from(FromSource::scan(FromItem::new(Expr::id("u")).alias("u"))),
        );
        let inner_id = inner.id;
        let outer_agg = count(Expr::id("x"));
        let outer_agg_id = outer_agg.id;
        let outer = Expr::select(grouped(Select::items(vec![
            ProjectItem::aliased(inner, "sub"),
            ProjectItem::aliased(outer_agg, "n"),
        ])));
        let outer_id = outer.id;

        let mut meta = NodeMeta::new();
        AggregateSupport
            .apply(Statement::query(outer), &mut meta)
            .unwrap();

        assert_eq!(meta.query_levels(), 2);
        assert_eq!(
            meta.aggregates(outer_id).unwrap().call_sites(),
            &[CallSite {
                id: 0,
                name: "count".to_string(),
                node: outer_agg_id,
            }]
        );
        assert_eq!(
            meta.aggregates(inner_id).unwrap().get(inner_agg_id).map(|s| s.id),
            Some(0)
        );
    }

    #[test]
    fn test_rerun_rebuilds_same_registry() {
        let query = Expr::select(grouped(Select::items(vec![
            ProjectItem::expr(count(Expr::int(1))),
            ProjectItem::expr(sum(Expr::id("x"))),
        ])));
        let id = query.id;

        let mut meta = NodeMeta::new();
        let once = AggregateSupport
            .apply(Statement::query(query), &mut meta)
            .unwrap();
        let first = meta.aggregates(id).cloned();
        let twice = AggregateSupport.apply(once.clone(), &mut meta).unwrap();
        assert_eq!(once, twice);
        assert_eq!(meta.aggregates(id).cloned(), first);
        assert_eq!(meta.aggregates(id).map(AggregateRegistry::len), Some(2));
    }
}
