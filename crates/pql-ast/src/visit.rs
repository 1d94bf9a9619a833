//! Borrowing traversal
//!
//! A [`Visitor`] walks a tree by reference. Every method defaults to walking
//! the node's children; returning an error stops the walk.

use crate::{
    DmlOp, Expr, ExprKind, FromItem, FromSource, GroupBy, PathStep, ProjectItem, Projection,
    Select, SortSpec, Statement,
};
use pql_diagnostics::Result;

/// Read-only tree walker
pub trait Visitor {
    fn visit_statement(&mut self, stmt: &Statement) -> Result<()> {
        walk_statement(self, stmt)
    }

    fn visit_expr(&mut self, expr: &Expr) -> Result<()> {
        walk_expr(self, expr)
    }

    fn visit_select(&mut self, select: &Select) -> Result<()> {
        walk_select(self, select)
    }

    fn visit_projection(&mut self, projection: &Projection) -> Result<()> {
        walk_projection(self, projection)
    }

    fn visit_from_source(&mut self, source: &FromSource) -> Result<()> {
        walk_from_source(self, source)
    }

    fn visit_from_item(&mut self, item: &FromItem) -> Result<()> {
        self.visit_expr(&item.expr)
    }

    fn visit_group_by(&mut self, group_by: &GroupBy) -> Result<()> {
        for key in &group_by.keys {
            self.visit_expr(&key.expr)?;
        }
        Ok(())
    }

    fn visit_sort_spec(&mut self, spec: &SortSpec) -> Result<()> {
        self.visit_expr(&spec.expr)
    }
}

pub fn walk_statement<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Statement) -> Result<()> {
    match stmt {
        Statement::Query(expr) => visitor.visit_expr(expr),
        Statement::Dml(dml) => {
            if let Some(from) = &dml.from {
                visitor.visit_from_source(from)?;
            }
            if let Some(predicate) = &dml.where_clause {
                visitor.visit_expr(predicate)?;
            }
            for op in &dml.operations {
                match op {
                    DmlOp::Insert { target, values } => {
                        visitor.visit_expr(target)?;
                        visitor.visit_expr(values)?;
                    }
                    DmlOp::Set(assignments) => {
                        for a in assignments {
                            visitor.visit_expr(&a.target)?;
                            visitor.visit_expr(&a.value)?;
                        }
                    }
                    DmlOp::Remove(target) => visitor.visit_expr(target)?,
                    DmlOp::Delete => {}
                }
            }
            Ok(())
        }
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) -> Result<()> {
    match &expr.kind {
        ExprKind::Lit(_) | ExprKind::Id(_) | ExprKind::Param(_) | ExprKind::GroupKeyRef(_) => Ok(()),
        ExprKind::Unary(u) => visitor.visit_expr(&u.operand),
        ExprKind::Binary(b) => {
            visitor.visit_expr(&b.lhs)?;
            visitor.visit_expr(&b.rhs)
        }
        ExprKind::Like(l) => {
            visitor.visit_expr(&l.value)?;
            visitor.visit_expr(&l.pattern)?;
            if let Some(escape) = &l.escape {
                visitor.visit_expr(escape)?;
            }
            Ok(())
        }
        ExprKind::Between(b) => {
            visitor.visit_expr(&b.value)?;
            visitor.visit_expr(&b.from)?;
            visitor.visit_expr(&b.to)
        }
        ExprKind::In(i) => {
            visitor.visit_expr(&i.lhs)?;
            visitor.visit_expr(&i.rhs)
        }
        ExprKind::Is(i) => visitor.visit_expr(&i.value),
        ExprKind::Path(p) => {
            visitor.visit_expr(&p.root)?;
            for step in &p.steps {
                if let PathStep::Index(index) = step {
                    visitor.visit_expr(index)?;
                }
            }
            Ok(())
        }
        ExprKind::Call(c) => c.args.iter().try_for_each(|a| visitor.visit_expr(a)),
        ExprKind::CallAgg(a) => match &a.arg {
            Some(arg) => visitor.visit_expr(arg),
            None => Ok(()),
        },
        ExprKind::SimpleCase(c) => {
            visitor.visit_expr(&c.operand)?;
            for b in &c.branches {
                visitor.visit_expr(&b.when)?;
                visitor.visit_expr(&b.then)?;
            }
            match &c.else_expr {
                Some(e) => visitor.visit_expr(e),
                None => Ok(()),
            }
        }
        ExprKind::SearchedCase(c) => {
            for b in &c.branches {
                visitor.visit_expr(&b.when)?;
                visitor.visit_expr(&b.then)?;
            }
            match &c.else_expr {
                Some(e) => visitor.visit_expr(e),
                None => Ok(()),
            }
        }
        ExprKind::NullIf(n) => {
            visitor.visit_expr(&n.lhs)?;
            visitor.visit_expr(&n.rhs)
        }
        ExprKind::Coalesce(args) => args.iter().try_for_each(|a| visitor.visit_expr(a)),
        ExprKind::Collection(c) => c.elements.iter().try_for_each(|e| visitor.visit_expr(e)),
        ExprKind::Struct(entries) => entries.iter().try_for_each(|e| {
            visitor.visit_expr(&e.key)?;
            visitor.visit_expr(&e.value)
        }),
        ExprKind::Cast(c) => visitor.visit_expr(&c.value),
        ExprKind::Select(select) => visitor.visit_select(select),
    }
}

pub fn walk_select<V: Visitor + ?Sized>(visitor: &mut V, select: &Select) -> Result<()> {
    if let Some(from) = &select.from {
        visitor.visit_from_source(from)?;
    }
    for binding in &select.let_clause {
        visitor.visit_expr(&binding.expr)?;
    }
    if let Some(predicate) = &select.where_clause {
        visitor.visit_expr(predicate)?;
    }
    if let Some(group_by) = &select.group_by {
        visitor.visit_group_by(group_by)?;
    }
    if let Some(having) = &select.having {
        visitor.visit_expr(having)?;
    }
    visitor.visit_projection(&select.projection)?;
    for spec in &select.order_by {
        visitor.visit_sort_spec(spec)?;
    }
    if let Some(limit) = &select.limit {
        visitor.visit_expr(limit)?;
    }
    if let Some(offset) = &select.offset {
        visitor.visit_expr(offset)?;
    }
    Ok(())
}

pub fn walk_projection<V: Visitor + ?Sized>(visitor: &mut V, projection: &Projection) -> Result<()> {
    match projection {
        Projection::Star => Ok(()),
        Projection::List(items) => items.iter().try_for_each(|item| match item {
            ProjectItem::All { expr } | ProjectItem::Expr { expr, .. } => visitor.visit_expr(expr),
        }),
        Projection::Value(expr) => visitor.visit_expr(expr),
        Projection::Pivot { value, key } => {
            visitor.visit_expr(value)?;
            visitor.visit_expr(key)
        }
    }
}

pub fn walk_from_source<V: Visitor + ?Sized>(visitor: &mut V, source: &FromSource) -> Result<()> {
    match source {
        FromSource::Scan(item) | FromSource::Unpivot(item) => visitor.visit_from_item(item),
        FromSource::Join(join) => {
            visitor.visit_from_source(&join.left)?;
            visitor.visit_from_source(&join.right)?;
            match &join.predicate {
                Some(p) => visitor.visit_expr(p),
                None => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FromItem, ProjectItem, Select};

    #[derive(Default)]
    struct CountIds(usize);

    impl Visitor for CountIds {
        fn visit_expr(&mut self, expr: &Expr) -> Result<()> {
            if matches!(expr.kind, ExprKind::Id(_)) {
                self.0 += 1;
            }
            walk_expr(self, expr)
        }
    }

    #[test]
    fn test_walk_covers_every_clause() {
        let select = Select::items(vec![ProjectItem::expr(Expr::id("a"))])
            .from(FromSource::scan(FromItem::new(Expr::id("t"))))
            .with_where(Expr::id("w"))
            .order_by(SortSpec::new(Expr::id("o")));
        let stmt = Statement::query(Expr::select(select));

        let mut counter = CountIds::default();
        counter.visit_statement(&stmt).unwrap();
        assert_eq!(counter.0, 4);
    }
}
