//! The pass abstraction

use pql_ast::{Expr, Identifier, NodeMeta, Statement};
use pql_diagnostics::Result;

/// A statement rewrite
///
/// Applying a pass to its own output must leave the statement and the
/// metadata it writes unchanged.
pub trait NormalizationPass: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Rewrite a statement, recording node metadata in `meta`
    fn apply(&self, statement: Statement, meta: &mut NodeMeta) -> Result<Statement>;
}

/// Alias for an item written without one
///
/// A variable or path gives its own name, anything else the 1-based
/// position of the item in its clause.
pub fn synthesize_alias(expr: &Expr, position: usize) -> Identifier {
    expr.derived_alias()
        .unwrap_or_else(|| Identifier::new(format!("_{position}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Expr::id("t"), 3, Identifier::new("t"))]
    #[case(Expr::dot(Expr::id("t"), "name"), 1, Identifier::new("name"))]
    #[case(Expr::index(Expr::id("t"), Expr::string("Name")), 1, Identifier::quoted("Name"))]
    #[case(Expr::bag(vec![]), 2, Identifier::new("_2"))]
    #[case(Expr::int(7), 1, Identifier::new("_1"))]
    fn test_synthesize_alias(
        #[case] expr: Expr,
        #[case] position: usize,
        #[case] expected: Identifier,
    ) {
        assert_eq!(synthesize_alias(&expr, position), expected);
    }
}
