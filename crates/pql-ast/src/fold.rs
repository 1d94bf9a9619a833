//! Owned rewriting traversal
//!
//! A [`Fold`] consumes a tree and produces a new one. Every method defaults to
//! rebuilding the node from its folded children, so a pass only overrides the
//! nodes it rewrites. Node identities and locations are carried over unchanged.

use crate::{
    AggregateCall, Assignment, BetweenExpr, BinaryExpr, BoxExpr, CallExpr, CaseBranch, CastExpr,
    CollectionExpr, DmlOp, DmlStatement, Expr, ExprKind, FromItem, FromSource, GroupBy, GroupKey,
    InExpr, IsTypeExpr, Join, LetBinding, LikeExpr, NullIfExpr, PathExpr, PathStep, ProjectItem,
    Projection, SearchedCaseExpr, Select, SimpleCaseExpr, SortSpec, Statement, StructEntry,
    UnaryExpr,
};
use pql_diagnostics::Result;

/// Owned tree rewriter
pub trait Fold {
    fn fold_statement(&mut self, stmt: Statement) -> Result<Statement> {
        fold_statement_children(self, stmt)
    }

    fn fold_expr(&mut self, expr: Expr) -> Result<Expr> {
        fold_expr_children(self, expr)
    }

    fn fold_select(&mut self, select: Select) -> Result<Select> {
        fold_select_children(self, select)
    }

    fn fold_projection(&mut self, projection: Projection) -> Result<Projection> {
        fold_projection_children(self, projection)
    }

    fn fold_project_item(&mut self, item: ProjectItem) -> Result<ProjectItem> {
        fold_project_item_children(self, item)
    }

    fn fold_from_source(&mut self, source: FromSource) -> Result<FromSource> {
        fold_from_source_children(self, source)
    }

    fn fold_from_item(&mut self, item: FromItem) -> Result<FromItem> {
        fold_from_item_children(self, item)
    }

    fn fold_group_by(&mut self, group_by: GroupBy) -> Result<GroupBy> {
        fold_group_by_children(self, group_by)
    }

    fn fold_group_key(&mut self, key: GroupKey) -> Result<GroupKey> {
        Ok(GroupKey {
            expr: self.fold_expr(key.expr)?,
            ..key
        })
    }

    fn fold_sort_spec(&mut self, spec: SortSpec) -> Result<SortSpec> {
        Ok(SortSpec {
            expr: self.fold_expr(spec.expr)?,
            ..spec
        })
    }

    fn fold_dml_op(&mut self, op: DmlOp) -> Result<DmlOp> {
        fold_dml_op_children(self, op)
    }
}

fn fold_box<F: Fold + ?Sized>(folder: &mut F, expr: BoxExpr) -> Result<BoxExpr> {
    Ok(Box::new(folder.fold_expr(*expr)?))
}

fn fold_opt_box<F: Fold + ?Sized>(folder: &mut F, expr: Option<BoxExpr>) -> Result<Option<BoxExpr>> {
    expr.map(|e| fold_box(folder, e)).transpose()
}

fn fold_exprs<F: Fold + ?Sized>(folder: &mut F, exprs: Vec<Expr>) -> Result<Vec<Expr>> {
    exprs.into_iter().map(|e| folder.fold_expr(e)).collect()
}

fn fold_branches<F: Fold + ?Sized>(
    folder: &mut F,
    branches: Vec<CaseBranch>,
) -> Result<Vec<CaseBranch>> {
    branches
        .into_iter()
        .map(|b| {
            Ok(CaseBranch {
                when: folder.fold_expr(b.when)?,
                then: folder.fold_expr(b.then)?,
            })
        })
        .collect()
}

pub fn fold_statement_children<F: Fold + ?Sized>(folder: &mut F, stmt: Statement) -> Result<Statement> {
    Ok(match stmt {
        Statement::Query(expr) => Statement::Query(folder.fold_expr(expr)?),
        Statement::Dml(dml) => {
            let from = dml.from.map(|f| folder.fold_from_source(f)).transpose()?;
            let where_clause = fold_opt_box(folder, dml.where_clause)?;
            let operations = dml
                .operations
                .into_iter()
                .map(|op| folder.fold_dml_op(op))
                .collect::<Result<_>>()?;
            Statement::Dml(DmlStatement {
                from,
                where_clause,
                operations,
                location: dml.location,
            })
        }
    })
}

pub fn fold_dml_op_children<F: Fold + ?Sized>(folder: &mut F, op: DmlOp) -> Result<DmlOp> {
    Ok(match op {
        DmlOp::Insert { target, values } => DmlOp::Insert {
            target: folder.fold_expr(target)?,
            values: folder.fold_expr(values)?,
        },
        DmlOp::Set(assignments) => DmlOp::Set(
            assignments
                .into_iter()
                .map(|a| {
                    Ok(Assignment {
                        target: folder.fold_expr(a.target)?,
                        value: folder.fold_expr(a.value)?,
                    })
                })
                .collect::<Result<_>>()?,
        ),
        DmlOp::Remove(target) => DmlOp::Remove(folder.fold_expr(target)?),
        DmlOp::Delete => DmlOp::Delete,
    })
}

pub fn fold_expr_children<F: Fold + ?Sized>(folder: &mut F, expr: Expr) -> Result<Expr> {
    let Expr { id, location, kind } = expr;
    let kind = match kind {
        kind @ (ExprKind::Lit(_) | ExprKind::Id(_) | ExprKind::Param(_) | ExprKind::GroupKeyRef(_)) => {
            kind
        }
        ExprKind::Unary(u) => ExprKind::Unary(UnaryExpr {
            op: u.op,
            operand: fold_box(folder, u.operand)?,
        }),
        ExprKind::Binary(b) => ExprKind::Binary(BinaryExpr {
            op: b.op,
            lhs: fold_box(folder, b.lhs)?,
            rhs: fold_box(folder, b.rhs)?,
        }),
        ExprKind::Like(l) => ExprKind::Like(LikeExpr {
            value: fold_box(folder, l.value)?,
            pattern: fold_box(folder, l.pattern)?,
            escape: fold_opt_box(folder, l.escape)?,
            negated: l.negated,
        }),
        ExprKind::Between(b) => ExprKind::Between(BetweenExpr {
            value: fold_box(folder, b.value)?,
            from: fold_box(folder, b.from)?,
            to: fold_box(folder, b.to)?,
            negated: b.negated,
        }),
        ExprKind::In(i) => ExprKind::In(InExpr {
            lhs: fold_box(folder, i.lhs)?,
            rhs: fold_box(folder, i.rhs)?,
            negated: i.negated,
        }),
        ExprKind::Is(i) => ExprKind::Is(IsTypeExpr {
            value: fold_box(folder, i.value)?,
            type_name: i.type_name,
            negated: i.negated,
        }),
        ExprKind::Path(p) => {
            let root = fold_box(folder, p.root)?;
            let steps = p
                .steps
                .into_iter()
                .map(|step| match step {
                    PathStep::Index(index) => Ok(PathStep::Index(fold_box(folder, index)?)),
                    other => Ok(other),
                })
                .collect::<Result<_>>()?;
            ExprKind::Path(PathExpr { root, steps })
        }
        ExprKind::Call(c) => ExprKind::Call(CallExpr {
            name: c.name,
            args: fold_exprs(folder, c.args)?,
        }),
        ExprKind::CallAgg(a) => ExprKind::CallAgg(AggregateCall {
            name: a.name,
            quantifier: a.quantifier,
            arg: fold_opt_box(folder, a.arg)?,
        }),
        ExprKind::SimpleCase(c) => ExprKind::SimpleCase(SimpleCaseExpr {
            operand: fold_box(folder, c.operand)?,
            branches: fold_branches(folder, c.branches)?,
            else_expr: fold_opt_box(folder, c.else_expr)?,
        }),
        ExprKind::SearchedCase(c) => ExprKind::SearchedCase(SearchedCaseExpr {
            branches: fold_branches(folder, c.branches)?,
            else_expr: fold_opt_box(folder, c.else_expr)?,
        }),
        ExprKind::NullIf(n) => ExprKind::NullIf(NullIfExpr {
            lhs: fold_box(folder, n.lhs)?,
            rhs: fold_box(folder, n.rhs)?,
        }),
        ExprKind::Coalesce(args) => ExprKind::Coalesce(fold_exprs(folder, args)?),
        ExprKind::Collection(c) => ExprKind::Collection(CollectionExpr {
            kind: c.kind,
            elements: fold_exprs(folder, c.elements)?,
        }),
        ExprKind::Struct(entries) => ExprKind::Struct(
            entries
                .into_iter()
                .map(|e| {
                    Ok(StructEntry {
                        key: folder.fold_expr(e.key)?,
                        value: folder.fold_expr(e.value)?,
                    })
                })
                .collect::<Result<_>>()?,
        ),
        ExprKind::Cast(c) => ExprKind::Cast(CastExpr {
            kind: c.kind,
            value: fold_box(folder, c.value)?,
            as_type: c.as_type,
        }),
        ExprKind::Select(select) => ExprKind::Select(Box::new(folder.fold_select(*select)?)),
    };
    Ok(Expr { id, location, kind })
}

pub fn fold_select_children<F: Fold + ?Sized>(folder: &mut F, select: Select) -> Result<Select> {
    let from = select.from.map(|f| folder.fold_from_source(f)).transpose()?;
    let let_clause = select
        .let_clause
        .into_iter()
        .map(|binding| {
            Ok(LetBinding {
                expr: folder.fold_expr(binding.expr)?,
                alias: binding.alias,
            })
        })
        .collect::<Result<_>>()?;
    let where_clause = fold_opt_box(folder, select.where_clause)?;
    let group_by = select.group_by.map(|g| folder.fold_group_by(g)).transpose()?;
    let having = fold_opt_box(folder, select.having)?;
    let projection = folder.fold_projection(select.projection)?;
    let order_by = select
        .order_by
        .into_iter()
        .map(|spec| folder.fold_sort_spec(spec))
        .collect::<Result<_>>()?;
    let limit = fold_opt_box(folder, select.limit)?;
    let offset = fold_opt_box(folder, select.offset)?;

    Ok(Select {
        quantifier: select.quantifier,
        projection,
        from,
        let_clause,
        where_clause,
        group_by,
        having,
        order_by,
        limit,
        offset,
    })
}

pub fn fold_projection_children<F: Fold + ?Sized>(
    folder: &mut F,
    projection: Projection,
) -> Result<Projection> {
    Ok(match projection {
        Projection::Star => Projection::Star,
        Projection::List(items) => Projection::List(
            items
                .into_iter()
                .map(|item| folder.fold_project_item(item))
                .collect::<Result<_>>()?,
        ),
        Projection::Value(expr) => Projection::Value(fold_box(folder, expr)?),
        Projection::Pivot { value, key } => Projection::Pivot {
            value: fold_box(folder, value)?,
            key: fold_box(folder, key)?,
        },
    })
}

pub fn fold_project_item_children<F: Fold + ?Sized>(
    folder: &mut F,
    item: ProjectItem,
) -> Result<ProjectItem> {
    Ok(match item {
        ProjectItem::All { expr } => ProjectItem::All {
            expr: folder.fold_expr(expr)?,
        },
        ProjectItem::Expr { expr, alias } => ProjectItem::Expr {
            expr: folder.fold_expr(expr)?,
            alias,
        },
    })
}

pub fn fold_from_source_children<F: Fold + ?Sized>(
    folder: &mut F,
    source: FromSource,
) -> Result<FromSource> {
    Ok(match source {
        FromSource::Scan(item) => FromSource::Scan(folder.fold_from_item(item)?),
        FromSource::Unpivot(item) => FromSource::Unpivot(folder.fold_from_item(item)?),
        FromSource::Join(join) => {
            let Join {
                kind,
                left,
                right,
                predicate,
            } = *join;
            let left = folder.fold_from_source(left)?;
            let right = folder.fold_from_source(right)?;
            let predicate = predicate.map(|p| folder.fold_expr(p)).transpose()?;
            FromSource::Join(Box::new(Join {
                kind,
                left,
                right,
                predicate,
            }))
        }
    })
}

pub fn fold_from_item_children<F: Fold + ?Sized>(folder: &mut F, item: FromItem) -> Result<FromItem> {
    Ok(FromItem {
        expr: folder.fold_expr(item.expr)?,
        ..item
    })
}

pub fn fold_group_by_children<F: Fold + ?Sized>(folder: &mut F, group_by: GroupBy) -> Result<GroupBy> {
    Ok(GroupBy {
        keys: group_by
            .keys
            .into_iter()
            .map(|key| folder.fold_group_key(key))
            .collect::<Result<_>>()?,
        ..group_by
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Literal, Select};
    use pretty_assertions::assert_eq;

    /// Increments every integer literal
    struct Bump;

    impl Fold for Bump {
        fn fold_expr(&mut self, expr: Expr) -> Result<Expr> {
            match expr.kind {
                ExprKind::Lit(Literal::Integer(v)) => Ok(Expr {
                    kind: ExprKind::Lit(Literal::Integer(v + 1)),
                    ..expr
                }),
                _ => fold_expr_children(self, expr),
            }
        }
    }

    #[test]
    fn test_fold_reaches_nested_queries_and_keeps_ids() {
        let inner = Expr::select(Select::value(Expr::int(1)));
        let outer = Expr::binary(Expr::int(41), crate::BinaryOp::Add, inner);
        let outer_id = outer.id;

        let folded = Bump.fold_expr(outer).unwrap();
        assert_eq!(folded.id, outer_id);
        assert_eq!(folded.to_string(), "42 + (SELECT VALUE 2)");
    }
}
