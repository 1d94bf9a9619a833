//! Structural checks run before normalization

use log::debug;
use pql_ast::{
    Expr, ExprKind, GroupingStrategy, Literal, Projection, Select, SourceLocation, Statement,
    Visitor, walk_expr,
};
use pql_diagnostics::{Result, SemanticError};

/// Rejects statements the front-end does not support
///
/// Every query level is checked. The first violation ends the walk:
/// - `GROUP PARTIAL BY`
/// - `PIVOT` together with `GROUP BY`
/// - `HAVING` without a `GROUP BY` that has at least one key
/// - integer literals outside the 64-bit range
#[derive(Debug, Clone, Copy, Default)]
pub struct SanityValidator;

impl SanityValidator {
    pub fn validate(&self, statement: &Statement) -> Result<()> {
        debug!("validating statement");
        StructureCheck.visit_statement(statement)
    }
}

struct StructureCheck;

impl StructureCheck {
    fn check_select(&self, select: &Select, location: SourceLocation) -> Result<()> {
        if let Some(group_by) = &select.group_by {
            if group_by.strategy == GroupingStrategy::Partial {
                return Err(SemanticError::UnsupportedFeature {
                    feature: "GROUP PARTIAL BY".to_string(),
                    location,
                });
            }
            if matches!(select.projection, Projection::Pivot { .. }) {
                return Err(SemanticError::UnsupportedFeature {
                    feature: "PIVOT with GROUP BY".to_string(),
                    location,
                });
            }
        }
        if let Some(having) = &select.having {
            let has_keys = select
                .group_by
                .as_ref()
                .is_some_and(|g| !g.keys.is_empty());
            if !has_keys {
                return Err(SemanticError::HavingWithoutGroupBy {
                    location: having.location,
                });
            }
        }
        Ok(())
    }
}

impl Visitor for StructureCheck {
    fn visit_expr(&mut self, expr: &Expr) -> Result<()> {
        match &expr.kind {
            ExprKind::Lit(Literal::Integer(value)) if i64::try_from(*value).is_err() => {
                Err(SemanticError::IntegerOverflow {
                    literal: value.to_string(),
                    location: expr.location,
                })
            }
            ExprKind::Select(select) => {
                self.check_select(select, expr.location)?;
                walk_expr(self, expr)
            }
            _ => walk_expr(self, expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pql_ast::{
        BinaryOp, DmlOp, DmlStatement, FromItem, FromSource, GroupBy, GroupKey, ProjectItem,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn from_t() -> FromSource {
        FromSource::scan(FromItem::new(Expr::id("t")).alias("t"))
    }

    fn validate(expr: Expr) -> Result<()> {
        SanityValidator.validate(&Statement::query(expr))
    }

    #[test]
    fn test_valid_grouped_query() {
        let select = Select::items(vec![ProjectItem::expr(Expr::id("k"))])
            .from(from_t())
            .group_by(GroupBy::new(vec![GroupKey::aliased(Expr::id("a"), "k")]))
            .having(Expr::boolean(true));
        assert_eq!(validate(Expr::select(select)), Ok(()));
    }

    #[test]
    fn test_partial_grouping_in_nested_query() {
        let inner = Select::value(Expr::int(1))
            .from(from_t())
            .group_by(GroupBy::new(vec![GroupKey::new(Expr::id("a"))]).partial());
        let inner = Expr::select(inner).with_location(SourceLocation::new(1, 20, 30));
        let outer = Select::value(inner).from(from_t());

        let err = validate(Expr::select(outer)).unwrap_err();
        assert_eq!(
            err,
            SemanticError::UnsupportedFeature {
                feature: "GROUP PARTIAL BY".to_string(),
                location: SourceLocation::new(1, 20, 30),
            }
        );
    }

    #[test]
    fn test_pivot_with_group_by() {
        let select = Select::new(Projection::Pivot {
            value: Box::new(Expr::id("v")),
            key: Box::new(Expr::id("k")),
        })
        .from(from_t())
        .group_by(GroupBy::new(vec![GroupKey::new(Expr::id("k"))]));
        assert!(matches!(
            validate(Expr::select(select)),
            Err(SemanticError::UnsupportedFeature { .. })
        ));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(GroupBy::new(vec![])))]
    fn test_having_needs_group_keys(#[case] group_by: Option<GroupBy>) {
        let having = Expr::boolean(true).with_location(SourceLocation::new(1, 30, 4));
        let mut select = Select::star().from(from_t()).having(having);
        select.group_by = group_by;
        assert_eq!(
            validate(Expr::select(select)),
            Err(SemanticError::HavingWithoutGroupBy {
                location: SourceLocation::new(1, 30, 4),
            })
        );
    }

    #[rstest]
    #[case(i128::from(i64::MAX), true)]
    #[case(i128::from(i64::MIN), true)]
    #[case(i128::from(i64::MAX) + 1, false)]
    #[case(i128::from(i64::MIN) - 1, false)]
    fn test_integer_range(#[case] value: i128, #[case] valid: bool) {
        let expr = Expr::binary(Expr::int(value), BinaryOp::Add, Expr::int(1));
        assert_eq!(validate(expr).is_ok(), valid);
    }

    #[test]
    fn test_dml_literals_are_checked() {
        let dml = DmlStatement::new(vec![DmlOp::Remove(Expr::index(
            Expr::id("t"),
            Expr::int(i128::MAX),
        ))])
        .from(from_t());
        let err = SanityValidator
            .validate(&Statement::Dml(dml))
            .unwrap_err();
        assert!(matches!(err, SemanticError::IntegerOverflow { .. }));
    }
}
