//! The normalization pipeline

use log::debug;
use pql_ast::{NodeMeta, Statement};
use pql_diagnostics::Result;

use crate::{
    AggregateSupport, FromSourceAlias, GroupByItemAlias, GroupKeyReferences, NormalizationPass,
    OrderBySortSpec, SelectListItemAlias, SelectStar,
};

/// Runs passes in order, each on the output of the previous one
///
/// Later passes read metadata written by earlier ones, so the standard
/// order must be kept.
pub struct NormalizationPipeline {
    passes: Vec<Box<dyn NormalizationPass>>,
}

impl NormalizationPipeline {
    /// The standard pipeline
    pub fn new() -> Self {
        let passes: Vec<Box<dyn NormalizationPass>> = vec![
            Box::new(FromSourceAlias),
            Box::new(GroupByItemAlias),
            Box::new(AggregateSupport),
            Box::new(GroupKeyReferences),
            Box::new(SelectListItemAlias),
            Box::new(OrderBySortSpec),
            Box::new(SelectStar),
        ];
        Self { passes }
    }

    /// A pipeline without passes
    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    /// Append a pass
    pub fn add_pass(&mut self, pass: Box<dyn NormalizationPass>) {
        self.passes.push(pass);
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass
    pub fn run(&self, statement: Statement, meta: &mut NodeMeta) -> Result<Statement> {
        let mut current = statement;
        for pass in &self.passes {
            current = pass.apply(current, meta)?;
            debug!("finished {}", pass.name());
        }
        Ok(current)
    }
}

impl Default for NormalizationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NormalizationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizationPipeline")
            .field("passes", &self.pass_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pql_ast::{
        BinaryOp, Expr, FromItem, FromSource, GroupBy, GroupKey, ProjectItem, Select,
        SetQuantifier, SortSpec,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_standard_order() {
        assert_eq!(
            NormalizationPipeline::new().pass_names(),
            vec![
                "FromSourceAlias",
                "GroupByItemAlias",
                "AggregateSupport",
                "GroupKeyReferences",
                "SelectListItemAlias",
                "OrderBySortSpec",
                "SelectStar",
            ]
        );
        assert!(NormalizationPipeline::empty().pass_names().is_empty());
    }

    #[test]
    fn test_grouped_query_end_to_end() {
        let select = Select::items(vec![
            ProjectItem::expr(Expr::dot(Expr::id("o"), "region")),
            ProjectItem::expr(Expr::agg(
                "sum",
                SetQuantifier::All,
                Some(Expr::dot(Expr::id("o"), "total")),
            )),
        ])
        .from(FromSource::scan(FromItem::new(Expr::id("orders")).alias("o")))
        .group_by(GroupBy::new(vec![GroupKey::new(Expr::dot(Expr::id("o"), "region"))]))
        .having(Expr::binary(
            Expr::agg("count", SetQuantifier::All, None),
            BinaryOp::Gt,
            Expr::int(1),
        ))
        .order_by(SortSpec::new(Expr::id("_2")).desc());
        let query = Expr::select(select);
        let id = query.id;

        let mut meta = NodeMeta::new();
        let out = NormalizationPipeline::new()
            .run(Statement::query(query), &mut meta)
            .unwrap();

        // a path is never a key reference, only its alias is synthesized
        assert_eq!(
            out.to_string(),
            "SELECT o.region AS region, sum(o.total) AS _2 FROM orders AS o \
             GROUP BY o.region AS region HAVING count(*) > 1 ORDER BY sum(o.total) DESC"
        );
        assert_eq!(
            meta.aggregates(id).unwrap().summary(),
            vec![("count".to_string(), 0), ("sum".to_string(), 1)]
        );
    }

    #[test]
    fn test_custom_pass_runs_last() {
        struct Fail;
        impl NormalizationPass for Fail {
            fn name(&self) -> &'static str {
                "Fail"
            }
            fn apply(&self, _statement: Statement, _meta: &mut NodeMeta) -> Result<Statement> {
                Err(pql_diagnostics::SemanticError::Configuration {
                    message: "stop".to_string(),
                })
            }
        }

        let mut pipeline = NormalizationPipeline::new();
        pipeline.add_pass(Box::new(Fail));
        assert_eq!(pipeline.pass_names().last(), Some(&"Fail"));
        assert!(pipeline
            .run(Statement::query(Expr::int(1)), &mut NodeMeta::new())
            .is_err());
    }
}
