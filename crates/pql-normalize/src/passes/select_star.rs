//! Expansion of `SELECT *`

use log::{debug, trace};
use pql_ast::{
    Expr, ExprKind, Fold, FromItem, GroupBy, GroupKeyRef, Identifier, NodeMeta, ProjectItem,
    Projection, ScopeQualifier, Select, SourceLocation, Statement, VarRef, fold_select_children,
};
use pql_diagnostics::{Result, SemanticError};

use crate::NormalizationPass;

/// Expands `SELECT *` into an explicit select list
///
/// An ungrouped query projects, per FROM item in clause order, `"a".*` for
/// its `AS` alias followed by `"at" AS at` and `"by" AS by` for its `AT` and
/// `BY` aliases. A grouped query projects each key by its unique name under
/// the key's alias, then `"g" AS g` for its `GROUP AS` alias. Needs the
/// aliases and unique names written by earlier passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectStar;

impl NormalizationPass for SelectStar {
    fn name(&self) -> &'static str {
        "SelectStar"
    }

    fn apply(&self, statement: Statement, meta: &mut NodeMeta) -> Result<Statement> {
        debug!("running {}", self.name());
        StarExpander { meta }.fold_statement(statement)
    }
}

struct StarExpander<'m> {
    meta: &'m NodeMeta,
}

impl Fold for StarExpander<'_> {
    fn fold_select(&mut self, select: Select) -> Result<Select> {
        let select = fold_select_children(self, select)?;
        if !matches!(select.projection, Projection::Star) {
            return Ok(select);
        }
        let items = match &select.group_by {
            Some(group_by) => self.grouped_items(group_by)?,
            None => {
                let from = select.from.as_ref().map(|f| f.items()).unwrap_or_default();
                from_items(&from)?
            }
        };
        trace!("expanded SELECT * into {} item(s)", items.len());
        Ok(Select {
            projection: Projection::List(items),
            ..select
        })
    }
}

impl StarExpander<'_> {
    fn grouped_items(&self, group_by: &GroupBy) -> Result<Vec<ProjectItem>> {
        let mut items = Vec::with_capacity(group_by.keys.len() + 1);
        for key in &group_by.keys {
            let location = key.expr.location;
            let Some(alias) = &key.alias else {
                return Err(missing("alias of GROUP BY key", location));
            };
            let Some(unique) = self.meta.unique_name(key.id) else {
                return Err(missing("unique name of GROUP BY key", location));
            };
            let reference = Expr::at(
                ExprKind::GroupKeyRef(GroupKeyRef {
                    unique_name: unique.to_string(),
                    surface: alias.clone(),
                }),
                location,
            );
            items.push(ProjectItem::aliased(reference, alias.clone()));
        }
        if let Some(alias) = &group_by.group_as {
            items.push(ProjectItem::aliased(
                variable(alias, SourceLocation::default()),
                alias.clone(),
            ));
        }
        Ok(items)
    }
}

fn from_items(from: &[&FromItem]) -> Result<Vec<ProjectItem>> {
    let mut items = Vec::with_capacity(from.len());
    for item in from {
        let location = item.location();
        let Some(alias) = &item.as_alias else {
            return Err(missing("alias of FROM item", location));
        };
        items.push(ProjectItem::all(variable(alias, location)));
        for alias in [&item.at_alias, &item.by_alias].into_iter().flatten() {
            items.push(ProjectItem::aliased(variable(alias, location), alias.clone()));
        }
    }
    Ok(items)
}

/// Case-sensitive reference to a binding
fn variable(alias: &Identifier, location: SourceLocation) -> Expr {
    Expr::at(
        ExprKind::Id(VarRef {
            name: Identifier::quoted(alias.name.clone()),
            qualifier: ScopeQualifier::Unqualified,
        }),
        location,
    )
}

fn missing(what: &str, location: SourceLocation) -> SemanticError {
    SemanticError::MissingMetadata {
        what: what.to_string(),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FromSourceAlias, GroupByItemAlias};
    use pql_ast::{FromSource, GroupKey, SetQuantifier};
    use pretty_assertions::assert_eq;

    fn expand(select: Select) -> Result<Statement> {
        let mut meta = NodeMeta::new();
        let statement = Statement::query(Expr::select(select));
        let statement = FromSourceAlias.apply(statement, &mut meta)?;
        let statement = GroupByItemAlias.apply(statement, &mut meta)?;
        SelectStar.apply(statement, &mut meta)
    }

    #[test]
    fn test_ungrouped_star() {
        let select = Select::star().from(FromSource::comma(
            FromSource::scan(FromItem::new(Expr::id("foo")).alias("f").at("i")),
            FromSource::scan(FromItem::new(Expr::id("bar")).by("b")),
        ));
        assert_eq!(
            expand(select).unwrap().to_string(),
            "SELECT \"f\".*, \"i\" AS i, \"bar\".*, \"b\" AS b FROM foo AS f AT i, bar AS bar BY b"
        );
    }

    #[test]
    fn test_distinct_is_kept() {
        let select = Select::star()
            .distinct()
            .from(FromSource::scan(FromItem::new(Expr::id("foo")).alias("f")));
        let out = expand(select).unwrap();
        let select = out.as_query().and_then(Expr::as_select).unwrap();
        assert_eq!(select.quantifier, SetQuantifier::Distinct);
        assert_eq!(select.projection.to_string(), "\"f\".*");
    }

    #[test]
    fn test_grouped_star() {
        let select = Select::star()
            .from(FromSource::scan(FromItem::new(Expr::id("foo")).alias("f")))
            .group_by(
                GroupBy::new(vec![
                    GroupKey::aliased(Expr::dot(Expr::id("f"), "a"), "a"),
                    GroupKey::new(Expr::dot(Expr::id("f"), "b")),
                ])
                .group_as("g"),
            );
        let out = expand(select).unwrap();
        let select = out.as_query().and_then(Expr::as_select).unwrap();
        assert_eq!(
            select.projection.to_string(),
            "\"$__partiql__group_by_0_item_0\" AS a, \"$__partiql__group_by_0_item_1\" AS b, \
             \"g\" AS g"
        );
    }

    #[test]
    fn test_missing_aliases_are_reported() {
        let select = Select::star().from(FromSource::scan(FromItem::new(Expr::id("foo"))));
        let err = SelectStar
            .apply(Statement::query(Expr::select(select)), &mut NodeMeta::new())
            .unwrap_err();
        assert!(matches!(err, SemanticError::MissingMetadata { .. }));
    }

    #[test]
    fn test_is_idempotent() {
        let select = Select::star().from(FromSource::scan(FromItem::new(Expr::id("foo"))));
        let once = expand(select).unwrap();
        let twice = SelectStar.apply(once.clone(), &mut NodeMeta::new()).unwrap();
        assert_eq!(once, twice);
    }
}
