//! Rewrite of GROUP BY alias references

use log::{debug, trace};
use pql_ast::{
    Expr, ExprKind, Fold, GroupBy, GroupKeyRef, Identifier, NodeMeta, Projection, Select,
    Statement, fold_expr_children, fold_projection_children, fold_select_children,
};
use pql_diagnostics::{Result, SemanticError};

use crate::NormalizationPass;

/// Replaces identifiers naming a GROUP BY key with a reference to the key
///
/// Only the select list and HAVING of the grouped query are rewritten;
/// aggregate arguments and nested queries are left alone. A key alias
/// matches case-insensitively unless it was quoted. Needs the unique names
/// written by [`GroupByItemAlias`](crate::GroupByItemAlias).
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupKeyReferences;

impl NormalizationPass for GroupKeyReferences {
    fn name(&self) -> &'static str {
        "GroupKeyReferences"
    }

    fn apply(&self, statement: Statement, meta: &mut NodeMeta) -> Result<Statement> {
        debug!("running {}", self.name());
        GroupedQueries { meta }.fold_statement(statement)
    }
}

struct GroupedQueries<'m> {
    meta: &'m NodeMeta,
}

impl GroupedQueries<'_> {
    fn key_names(&self, group_by: &GroupBy) -> Result<Vec<(Identifier, String)>> {
        group_by
            .keys
            .iter()
            .filter_map(|key| key.alias.as_ref().map(|alias| (key, alias)))
            .map(|(key, alias)| {
                let unique = self.meta.unique_name(key.id).ok_or_else(|| {
                    SemanticError::MissingMetadata {
                        what: format!("unique name of GROUP BY key {alias}"),
                        location: key.expr.location,
                    }
                })?;
                Ok((alias.clone(), unique.to_string()))
            })
            .collect()
    }
}

impl Fold for GroupedQueries<'_> {
    fn fold_select(&mut self, select: Select) -> Result<Select> {
        let select = fold_select_children(self, select)?;
        let Some(group_by) = &select.group_by else {
            return Ok(select);
        };

        let mut rewriter = KeyRewriter {
            keys: self.key_names(group_by)?,
        };
        let projection = match select.projection {
            Projection::List(items) => {
                fold_projection_children(&mut rewriter, Projection::List(items))?
            }
            other => other,
        };
        let having = select
            .having
            .map(|h| rewriter.fold_expr(*h).map(Box::new))
            .transpose()?;
        Ok(Select {
            projection,
            having,
            ..select
        })
    }
}

/// Rewrites key references within one query level
struct KeyRewriter {
    keys: Vec<(Identifier, String)>,
}

impl Fold for KeyRewriter {
    fn fold_expr(&mut self, expr: Expr) -> Result<Expr> {
        match &expr.kind {
            ExprKind::Id(var) => {
                let found = self
                    .keys
                    .iter()
                    .find(|(alias, _)| alias.matches(&var.name.name));
                let Some((_, unique)) = found else {
                    return Ok(expr);
                };
                trace!("{} refers to GROUP BY key {unique}", var.name);
                Ok(Expr {
                    kind: ExprKind::GroupKeyRef(GroupKeyRef {
                        unique_name: unique.clone(),
                        surface: var.name.clone(),
                    }),
                    ..expr
                })
            }
            ExprKind::Select(_) | ExprKind::CallAgg(_) => Ok(expr),
            _ => fold_expr_children(self, expr),
        }
    }
}
